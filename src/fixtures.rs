//! Shared content fixtures for unit tests.

use crate::core::{KnowledgeGraph, KnowledgeItem};

fn vocab(id: &str, native: &str, pinyin: &str, english: &str, tags: &[&str]) -> KnowledgeItem {
    tags.iter().fold(
        KnowledgeItem::vocabulary(id, native, pinyin, english),
        |item, tag| item.with_tag(*tag),
    )
}

/// The four personal pronouns.
pub fn pronouns() -> Vec<KnowledgeItem> {
    vec![
        vocab("v001", "我", "wǒ", "I, me", &["hsk1", "cluster:pronouns", "category:pronoun"]),
        vocab("v002", "你", "nǐ", "you", &["hsk1", "cluster:pronouns", "category:pronoun"]),
        vocab("v003", "他", "tā", "he, him", &["hsk1", "cluster:pronouns", "category:pronoun"]),
        vocab("v004", "她", "tā", "she, her", &["hsk1", "cluster:pronouns", "category:pronoun"]),
    ]
}

/// A small but complete beginner curriculum.
pub fn curriculum() -> Vec<KnowledgeItem> {
    let mut items = pronouns();
    items.extend([
        vocab("v005", "是", "shì", "to be", &["hsk1", "cluster:basic-verbs"]),
        vocab("v006", "不", "bù", "not, no", &["hsk1", "cluster:basic-verbs"]),
        vocab("v007", "老师", "lǎoshī", "teacher", &["hsk1", "cluster:people", "category:noun"]),
        vocab("v008", "学生", "xuésheng", "student", &["hsk1", "cluster:people", "category:noun"]),
        vocab("v009", "医生", "yīshēng", "doctor", &["hsk1", "cluster:people", "category:noun"]),
        vocab("v010", "喜欢", "xǐhuan", "to like", &["hsk1", "cluster:basic-verbs"]),
        vocab("v011", "朋友", "péngyou", "friend", &["hsk1", "cluster:people", "category:noun"]),
        vocab("v012", "很", "hěn", "very", &["hsk1", "cluster:adjectives"]),
        vocab("v013", "喝", "hē", "to drink", &["hsk1", "cluster:food-drink"]),
        vocab("v014", "茶", "chá", "tea", &["hsk1", "cluster:food-drink", "category:drink"]),
        vocab("v015", "咖啡", "kāfēi", "coffee", &["hsk1", "cluster:food-drink", "category:drink"]),
        vocab("v016", "米饭", "mǐfàn", "rice", &["hsk1", "cluster:food-drink", "category:food"]),
        vocab("v017", "高兴", "gāoxìng", "happy", &["hsk1", "cluster:adjectives", "category:adjective"]),
        vocab("v018", "吃", "chī", "to eat", &["hsk1", "cluster:food-drink"]),
        KnowledgeItem::grammar("g001", "Subject + 是 + Noun", "A is B")
            .with_tag("cluster:sentence-patterns")
            .with_prerequisite("v005"),
        KnowledgeItem::grammar("g002", "Subject + 不是 + Noun", "A is not B")
            .with_tag("cluster:sentence-patterns")
            .with_prerequisite("v006")
            .with_prerequisite("g001"),
        KnowledgeItem::grammar("g004", "Subject + 很 + Adjective", "A is very ...")
            .with_tag("cluster:sentence-patterns")
            .with_prerequisite("v012"),
        KnowledgeItem::grammar("g005", "Subject + 喜欢 + Object", "A likes B")
            .with_tag("cluster:sentence-patterns")
            .with_prerequisite("v010"),
    ]);
    items
}

/// Graph over [`curriculum`].
pub fn curriculum_graph() -> KnowledgeGraph {
    KnowledgeGraph::new(curriculum()).unwrap()
}
