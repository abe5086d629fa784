//! Category Rule Engine
//!
//! 商品名に対するキーワード規則を宣言順に評価し、カテゴリコードを割り当てるモジュール。
//! 最初に一致した規則のコードを返し、どの規則にも一致しない場合はデフォルトコードを返します。
//!
//! キーワードの一致判定は部分文字列の包含であり、単語境界は考慮しません。
//! そのため短いキーワード（例: `cat`）は意図しない語（例: `cation`）にも一致します。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// いずれか1つが含まれていれば成立するキーワード集合
pub type KeywordSet = Vec<String>;

/// カテゴリ規則
///
/// `all_of`のすべての集合について、商品名がその集合のいずれかのキーワードを
/// 含む場合に規則が成立します（"any of"の"all of"）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// カテゴリコード
    pub code: String,

    /// カテゴリの説明（レポート用）
    pub description: String,

    /// キーワード集合のリスト
    pub all_of: Vec<KeywordSet>,
}

impl CategoryRule {
    /// 新しい規則を生成
    pub fn new(code: &str, description: &str, all_of: &[&[&str]]) -> Self {
        Self {
            code: code.to_string(),
            description: description.to_string(),
            all_of: all_of
                .iter()
                .map(|set| set.iter().map(|k| k.to_string()).collect())
                .collect(),
        }
    }

    /// 正規化済みの商品名が規則に一致するかを判定する
    fn matches(&self, normalized_name: &str, _image_context: Option<&str>) -> bool {
        self.all_of
            .iter()
            .all(|set| set.iter().any(|keyword| normalized_name.contains(keyword.as_str())))
    }
}

/// カテゴリ割り当てエンジン
///
/// 規則は構築時に検証・正規化され、以後変更されません。
#[derive(Debug, Clone)]
pub struct CategoryEngine {
    rules: Vec<CategoryRule>,
    default_code: String,
    default_description: String,
}

impl CategoryEngine {
    /// 規則リストからエンジンを構築する
    ///
    /// キーワードは小文字化・前後の空白除去を行ってから保持します。
    ///
    /// # 戻り値
    ///
    /// * `Err(CatalogError::Config)` - コードが空の規則、キーワード集合が空の規則、
    ///   または空のキーワードを含む規則がある場合
    pub fn new(
        rules: Vec<CategoryRule>,
        default_code: impl Into<String>,
        default_description: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let default_code = default_code.into();
        if default_code.trim().is_empty() {
            return Err(CatalogError::Config(
                "Default category code must not be empty".to_string(),
            ));
        }

        let mut normalized = Vec::with_capacity(rules.len());
        for mut rule in rules {
            if rule.code.trim().is_empty() {
                return Err(CatalogError::Config(format!(
                    "Category rule '{}' has an empty code",
                    rule.description
                )));
            }
            if rule.all_of.is_empty() || rule.all_of.iter().any(|set| set.is_empty()) {
                return Err(CatalogError::Config(format!(
                    "Category rule {} needs at least one keyword in every keyword set",
                    rule.code
                )));
            }
            for set in rule.all_of.iter_mut() {
                for keyword in set.iter_mut() {
                    *keyword = normalize(keyword);
                    if keyword.is_empty() {
                        return Err(CatalogError::Config(format!(
                            "Category rule {} contains an empty keyword",
                            rule.code
                        )));
                    }
                }
            }
            normalized.push(rule);
        }

        Ok(Self {
            rules: normalized,
            default_code,
            default_description: default_description.into(),
        })
    }

    /// 商品名からカテゴリコードを決定する
    ///
    /// # 引数
    ///
    /// * `product_name` - 商品名（大文字・小文字、前後の空白は無視される）
    /// * `image_context` - 画像情報（予約済み、現在は判定に使用しない）
    pub fn assign(&self, product_name: &str, image_context: Option<&str>) -> &str {
        let name = normalize(product_name);
        if name.is_empty() {
            return &self.default_code;
        }

        self.rules
            .iter()
            .find(|rule| rule.matches(&name, image_context))
            .map(|rule| rule.code.as_str())
            .unwrap_or(&self.default_code)
    }

    /// カテゴリコードの説明を取得する
    pub fn describe(&self, code: &str) -> Option<&str> {
        if code == self.default_code {
            return Some(&self.default_description);
        }
        self.rules
            .iter()
            .find(|rule| rule.code == code)
            .map(|rule| rule.description.as_str())
    }

    /// デフォルトコード
    pub fn default_code(&self) -> &str {
        &self.default_code
    }

    /// 評価順の規則リスト
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// 商品名のリストに対する割り当て結果をコードごとに集計する
    pub fn histogram<'a, I>(&self, names: I) -> BTreeMap<String, usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counts = BTreeMap::new();
        for name in names {
            *counts.entry(self.assign(name, None).to_string()).or_insert(0) += 1;
        }
        counts
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_category_rules, DEFAULT_CATEGORY_CODE};

    fn default_engine() -> CategoryEngine {
        CategoryEngine::new(default_category_rules(), DEFAULT_CATEGORY_CODE, "Unknown").unwrap()
    }

    #[test]
    fn test_assign_known_examples() {
        let engine = default_engine();
        assert_eq!(engine.assign("Women's Leather Belt", None), "29264");
        assert_eq!(engine.assign("Pet Carrier for Dogs", None), "2062");
        assert_eq!(engine.assign("Unrelated Gadget", None), DEFAULT_CATEGORY_CODE);
    }

    #[test]
    fn test_assign_full_default_table() {
        let engine = default_engine();
        let cases = [
            ("Kitchen Utensil Set", "9923"),
            ("Beach Towel", "11809"),
            ("Nail Art Tools", "19843"),
            ("iPhone Case", "24380"),
            ("Women's Scarf", "29290"),
            ("Eyeglass Case", "29312"),
            ("Women's Wallet", "29324"),
            ("Women's Brooch", "29522"),
            ("Women's Necklace", "29542"),
            ("Cosmetic Case", "30988"),
            ("Pickleball Paddle", "36256"),
            ("School Pen Case", "39969"),
            ("Children's Book", "46208"),
            ("Tote Bag", "29163"),
            ("Backpack", "29164"),
            ("Wallet", "29165"),
        ];
        for (name, expected) in cases {
            assert_eq!(engine.assign(name, None), expected, "name: {}", name);
        }
    }

    #[test]
    fn test_assign_normalizes_case_and_whitespace() {
        let engine = default_engine();
        assert_eq!(engine.assign("   PET CARRIER  ", None), "2062");
        assert_eq!(engine.assign("", None), DEFAULT_CATEGORY_CODE);
        assert_eq!(engine.assign("   ", None), DEFAULT_CATEGORY_CODE);
    }

    // 先に宣言された規則が優先される
    #[test]
    fn test_first_match_wins() {
        let rules = vec![
            CategoryRule::new("A", "first", &[&["bag"]]),
            CategoryRule::new("B", "second", &[&["tote"], &["bag"]]),
        ];
        let engine = CategoryEngine::new(rules, "Z", "Unknown").unwrap();
        assert_eq!(engine.assign("Tote Bag", None), "A");
    }

    #[test]
    fn test_all_of_requires_every_set() {
        let rules = vec![CategoryRule::new(
            "29264",
            "Belts",
            &[&["women", "ladies"], &["belt", "strap"]],
        )];
        let engine = CategoryEngine::new(rules, "0", "Unknown").unwrap();
        assert_eq!(engine.assign("Ladies Strap", None), "29264");
        assert_eq!(engine.assign("Leather Belt", None), "0");
        assert_eq!(engine.assign("Women's Hat", None), "0");
    }

    // 部分文字列一致のため短いキーワードは過剰に一致する
    #[test]
    fn test_substring_matching_over_matches() {
        let rules = vec![CategoryRule::new("2062", "Pets", &[&["cat"], &["carrier"]])];
        let engine = CategoryEngine::new(rules, "0", "Unknown").unwrap();
        assert_eq!(engine.assign("Communication Carrier", None), "2062");
    }

    #[test]
    fn test_keywords_are_normalized() {
        let rules = vec![CategoryRule::new("1", "Upper", &[&["  BELT "]])];
        let engine = CategoryEngine::new(rules, "0", "Unknown").unwrap();
        assert_eq!(engine.assign("belt", None), "1");
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let empty_sets = vec![CategoryRule::new("1", "Empty", &[])];
        assert!(CategoryEngine::new(empty_sets, "0", "Unknown").is_err());

        let empty_keyword = vec![CategoryRule::new("1", "Blank", &[&["  "]])];
        assert!(CategoryEngine::new(empty_keyword, "0", "Unknown").is_err());

        let empty_code = vec![CategoryRule::new("", "No code", &[&["bag"]])];
        assert!(CategoryEngine::new(empty_code, "0", "Unknown").is_err());

        assert!(CategoryEngine::new(vec![], " ", "Unknown").is_err());
    }

    #[test]
    fn test_describe_and_histogram() {
        let engine = default_engine();
        assert_eq!(engine.describe("2062"), Some("Pet Supplies / Small Animals / Carriers"));
        assert_eq!(engine.describe(DEFAULT_CATEGORY_CODE), Some("Unknown"));
        assert_eq!(engine.describe("does-not-exist"), None);

        let histogram = engine.histogram(["Tote Bag", "Backpack", "Tote", "Gadget"]);
        assert_eq!(histogram.get("29163"), Some(&2));
        assert_eq!(histogram.get("29164"), Some(&1));
        assert_eq!(histogram.get(DEFAULT_CATEGORY_CODE), Some(&1));
    }

    #[test]
    fn test_deterministic() {
        let engine = default_engine();
        let first: Vec<_> = ["Beach Towel", "Wallet", "Gadget"]
            .iter()
            .map(|n| engine.assign(n, None).to_string())
            .collect();
        let second: Vec<_> = ["Beach Towel", "Wallet", "Gadget"]
            .iter()
            .map(|n| engine.assign(n, None).to_string())
            .collect();
        assert_eq!(first, second);
    }
}
