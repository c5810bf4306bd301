//! Fallback quote sourcing for exhausted generation requests.
//!
//! Preference order: a random prior persisted quote, else a random entry
//! from the built-in corpus below. The corpus is frozen at build time.

use rand::seq::SliceRandom;

use super::error::StoreError;
use super::store::QuoteStore;

/// Historically-attested quotations used when no history exists yet.
pub const BUILTIN_QUOTES: &[(&str, &str)] = &[
    (
        "未经审视的生活不值得过，因为只有通过理性的反思，我们才能真正理解生命的意义",
        "苏格拉底",
    ),
    (
        "我们所看到的世界只是洞穴墙壁上的影子，真正的实在存在于理念的世界中",
        "柏拉图",
    ),
    (
        "人生的本质就是痛苦，而痛苦的根源在于我们永不满足的意志和欲望",
        "叔本华",
    ),
    (
        "当你凝视深渊时，深渊也在凝视着你。人必须在虚无中创造自己的价值",
        "尼采",
    ),
    (
        "有两种东西，我对它们的思考越是深沉和持久，它们在我心灵中唤起的惊奇和敬畏就会日新月异，不断增长，这就是我头上的星空和心中的道德律",
        "康德",
    ),
    (
        "人是被抛入这个世界的，但人有选择自己存在方式的自由，这就是人的本质",
        "萨特",
    ),
    (
        "吾生也有涯，而知也无涯。以有涯随无涯，殆已！知识虽然无穷，但我们要懂得适可而止",
        "庄子",
    ),
    (
        "君子之道，暗然而日章；小人之道，的然而日亡。君子之道，淡而不厌，简而文，温而理",
        "孔子",
    ),
    (
        "道生一，一生二，二生三，三生万物。万物负阴而抱阳，冲气以为和",
        "老子",
    ),
    (
        "存在先于本质，人首先存在，然后通过自己的选择和行动来定义自己是什么",
        "萨特",
    ),
    (
        "理性是人类最高贵的能力，但理性也有其界限，在界限之外是信仰的领域",
        "康德",
    ),
    (
        "真正的哲学问题只有一个：自杀。判断生活是否值得经历，这本身就是在回答哲学的根本问题",
        "加缪",
    ),
    (
        "人的本质不是抽象的存在于单个人身上，在其现实性上，它是一切社会关系的总和",
        "马克思",
    ),
    (
        "我们无法选择我们的出身，但我们可以选择我们成为什么样的人",
        "萨特",
    ),
    (
        "哲学的任务不是改变世界，而是解释世界，但解释世界的目的最终还是为了改变世界",
        "马克思",
    ),
];

/// Pick a substitute quote for `exclude_date`. Store failures propagate and
/// are fatal to the enclosing fallback step.
pub async fn select_fallback(
    store: &QuoteStore,
    exclude_date: &str,
) -> Result<(String, String), StoreError> {
    let history = store.list_excluding(exclude_date).await?;
    if let Some(prior) = history.choose(&mut rand::thread_rng()) {
        return Ok((prior.content.clone(), prior.author.clone()));
    }
    Ok(pick_builtin())
}

fn pick_builtin() -> (String, String) {
    // The corpus is non-empty by construction.
    let (content, author) = BUILTIN_QUOTES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(BUILTIN_QUOTES[0]);
    (content.to_string(), author.to_string())
}
