//! Configuration Module
//!
//! 変換処理の設定を型付きの構造体として定義するモジュール。
//! JSONファイルから読み込むことができ、読み込み時に一度だけ検証されます。
//! `Config::default()`は既定のテンプレートレイアウトに合わせた設定を返します。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::api::{OutputFormat, SheetSelector, TransformKind};
use crate::error::CatalogError;
use crate::rules::{CategoryEngine, CategoryRule};
use crate::transform::{TransformEntry, TransformRegistry};

/// どの規則にも一致しない商品に割り当てるカテゴリコード
pub const DEFAULT_CATEGORY_CODE: &str = "29153";

/// 1ファイルあたりの最大行数（デフォルト）
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// 最大入力ファイルサイズ（デフォルト: 2GB）
pub const DEFAULT_MAX_INPUT_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// ソース列から出力列への対応
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// ソース列名（大文字・小文字を区別する）
    pub source: String,

    /// 出力列名
    pub destination: String,
}

impl ColumnMapping {
    /// 新しい対応を生成
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// すべての出力行に設定する固定値
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedValue {
    /// 出力列名
    pub column: String,

    /// 固定値
    pub value: String,
}

impl FixedValue {
    /// 新しい固定値を生成
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }
}

/// パーティション定義
///
/// `prefixes`が空のパーティションはキャッチオールであり、最後に宣言する必要があります。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSpec {
    /// パーティション名
    pub name: String,

    /// SKUの接頭辞
    #[serde(default)]
    pub prefixes: Vec<String>,

    /// 出力ファイルのパス
    pub output: PathBuf,

    /// 説明
    #[serde(default)]
    pub description: String,
}

impl PartitionSpec {
    /// 新しいパーティション定義を生成
    pub fn new(name: &str, prefixes: &[&str], output: impl Into<PathBuf>, description: &str) -> Self {
        Self {
            name: name.to_string(),
            prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
            output: output.into(),
            description: description.to_string(),
        }
    }

    /// キャッチオールかどうか
    pub fn is_catch_all(&self) -> bool {
        self.prefixes.is_empty()
    }
}

/// ソースワークブックのレイアウト
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceLayout {
    /// 読み込むシート
    pub sheet: SheetSelector,

    /// ヘッダー行のインデックス（0始まり）
    pub header_row: u32,

    /// ヘッダー直後に読み飛ばす説明行の数
    pub skip_rows: u32,
}

impl Default for SourceLayout {
    fn default() -> Self {
        Self {
            sheet: SheetSelector::Name("Products".to_string()),
            header_row: 0,
            skip_rows: 3,
        }
    }
}

/// テンプレートワークブックのレイアウト
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateLayout {
    /// 読み込むシート
    pub sheet: SheetSelector,

    /// ヘッダー行のインデックス（0始まり）
    pub header_row: u32,

    /// データ開始行のインデックス（0始まり）
    ///
    /// これより前の行は定型行として出力にそのまま含まれます。
    pub data_start_row: u32,
}

impl Default for TemplateLayout {
    fn default() -> Self {
        Self {
            sheet: SheetSelector::Name("Template".to_string()),
            header_row: 1,
            data_start_row: 4,
        }
    }
}

/// カテゴリ割り当ての設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    /// カテゴリコードを書き込む出力列
    pub column: String,

    /// 商品名のソース列
    pub name_column: String,

    /// 画像情報のソース列（規則の予約引数として渡される）
    pub image_column: Option<String>,

    /// デフォルトコード
    pub default_code: String,

    /// デフォルトコードの説明
    pub default_description: String,

    /// 評価順の規則リスト
    pub rules: Vec<CategoryRule>,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        Self {
            column: "Category".to_string(),
            name_column: "Product Name (English)".to_string(),
            image_column: Some("Product Images".to_string()),
            default_code: DEFAULT_CATEGORY_CODE.to_string(),
            default_description: "Unknown".to_string(),
            rules: default_category_rules(),
        }
    }
}

/// 画像URLの設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// オプション画像のソース列（単一URL）
    pub option_image: String,

    /// 商品画像のソース列（空白・改行区切りの複数URL）
    pub product_images: String,

    /// 先頭のURLを書き込む詳細画像の出力列
    pub detail_column: String,

    /// バリアント画像の出力列名（テンプレート上の出現順に使用）
    pub variant_column: String,

    /// 使用するバリアント画像列の上限（`None`はテンプレート上のすべて）
    pub max_variant_images: Option<usize>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            option_image: "Option Image".to_string(),
            product_images: "Product Images".to_string(),
            detail_column: "Detail Images URL".to_string(),
            variant_column: "SKU Images URL".to_string(),
            max_variant_images: None,
        }
    }
}

/// 在庫フィルタの設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockConfig {
    /// 在庫のない行を除外するかどうか
    pub enabled: bool,

    /// 在庫数のソース列
    pub column: String,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            column: "On Hand Inventory".to_string(),
        }
    }
}

/// カラー未設定行の補完設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariationConfig {
    /// 補完を行うかどうか
    pub enabled: bool,

    /// カラーのソース列
    pub color_source: String,

    /// カラーの出力列
    pub color_column: String,

    /// バリエーションテーマの出力列
    pub theme_column: String,

    /// 補完時に設定するテーマ
    pub theme_value: String,

    /// 商品グループの判定に使うSKUのソース列
    pub sku_column: String,

    /// グループ内に1行しかない場合のカラー
    pub single_label: String,

    /// グループ内に複数行ある場合のカラー接頭辞（"Color 1", "Color 2", ...）
    pub numbered_prefix: String,
}

impl Default for VariationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            color_source: "Option 1 Value".to_string(),
            color_column: "Color".to_string(),
            theme_column: "Variation Theme".to_string(),
            theme_value: "Color".to_string(),
            sku_column: "SKU".to_string(),
            single_label: "One Color".to_string(),
            numbered_prefix: "Color".to_string(),
        }
    }
}

/// 更新用ファイルの設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateVariantConfig {
    /// 更新用ファイルを生成するかどうか
    pub enabled: bool,

    /// 空にする出力列
    pub blank_columns: Vec<String>,

    /// ステータス列
    pub status_column: String,

    /// 置換前のステータス
    pub status_from: String,

    /// 置換後のステータス
    pub status_to: String,

    /// 出力ファイル名の接尾辞
    pub suffix: String,
}

impl Default for UpdateVariantConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            blank_columns: vec![
                "Quantity".to_string(),
                "Base Price - USD".to_string(),
                "List Price - USD".to_string(),
            ],
            status_column: "Update or Add".to_string(),
            status_from: "Add".to_string(),
            status_to: "Update".to_string(),
            suffix: "_update".to_string(),
        }
    }
}

/// 出力の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// 出力フォーマット
    pub format: OutputFormat,

    /// 1ファイルあたりの最大行数
    pub chunk_size: usize,

    /// 出力ディレクトリ（指定時はパーティションの出力パスのファイル名だけを使用）
    pub dir: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Xlsx,
            chunk_size: DEFAULT_CHUNK_SIZE,
            dir: None,
        }
    }
}

/// 変換処理の設定全体
///
/// 処理開始前に一度だけ読み込まれ、以後変更されません。
/// JSONで一部のフィールドだけを指定した場合、残りはデフォルト値になります。
///
/// # 使用例
///
/// ```rust
/// use sheetbridge::Config;
///
/// let config = Config::from_json(r#"{ "stock": { "enabled": false } }"#).unwrap();
/// assert!(!config.stock.enabled);
/// assert_eq!(config.partitions.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// ソースのレイアウト
    pub source: SourceLayout,

    /// テンプレートのレイアウト
    pub template: TemplateLayout,

    /// 列の対応（宣言順に適用）
    pub mappings: Vec<ColumnMapping>,

    /// 固定値（列の対応の後に上書き）
    pub fixed_values: Vec<FixedValue>,

    /// (ソース列, 出力列)ごとの変換
    pub transforms: Vec<TransformEntry>,

    /// パーティションの判定に使うソース列
    pub partition_column: String,

    /// パーティション定義（宣言順に評価）
    pub partitions: Vec<PartitionSpec>,

    /// カテゴリ割り当て
    pub categories: CategoryConfig,

    /// 画像URL
    pub images: ImageConfig,

    /// 在庫フィルタ
    pub stock: StockConfig,

    /// カラー補完
    pub variation: VariationConfig,

    /// 更新用ファイル
    pub update_variant: UpdateVariantConfig,

    /// 出力
    pub output: OutputConfig,

    /// 最大入力ファイルサイズ（バイト）
    pub max_input_file_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        let mappings = [
            ("Product Name (English)", "Product Name"),
            ("Description (English)", "Product Description"),
            ("SKU", "Contribution SKU"),
            ("SKU", "Contribution Goods"),
            ("On Hand Inventory", "Quantity"),
            ("Made In Country", "Country/Region of Origin"),
            ("Option 1 Name", "Variation Theme"),
            ("Option 1 Value", "Color"),
            ("USD Unit Retail Price", "Base Price - USD"),
            ("USD Unit Retail Price", "List Price - USD"),
            ("Item Weight", "Weight - lb"),
            ("Item Length", "Length - in"),
            ("Item Width", "Width - in"),
            ("Item Height", "Height - in"),
        ]
        .iter()
        .map(|(s, d)| ColumnMapping::new(*s, *d))
        .collect();

        let fixed_values = [
            ("Country/Region of Origin", "Mainland China"),
            ("Province of Origin", "Guangdong"),
            ("Update or Add", "Add"),
            ("Shipping Template", "NIMA2"),
            (
                "California Proposition 65 Warning Type",
                "No Warning Applicable",
            ),
        ]
        .iter()
        .map(|(c, v)| FixedValue::new(*c, *v))
        .collect();

        let transforms = vec![
            TransformEntry::new(
                "Product Name (English)",
                "Product Name",
                TransformKind::NameCleanup { max_width: None },
            ),
            TransformEntry::new(
                "Description (English)",
                "Product Description",
                TransformKind::NameCleanup { max_width: None },
            ),
            TransformEntry::new("SKU", "Contribution Goods", TransformKind::SkuBaseCode),
            TransformEntry::new(
                "USD Unit Retail Price",
                "Base Price - USD",
                TransformKind::BasePrice,
            ),
            TransformEntry::new(
                "USD Unit Retail Price",
                "List Price - USD",
                TransformKind::ListPrice,
            ),
        ];

        let partitions = vec![
            PartitionSpec::new(
                "handbags",
                &["HBG", "HW", "HM", "HL"],
                "output/temu_template_handbags.xlsx",
                "Handbags, Wallets, Cosmetic Bags, Travel Bags",
            ),
            PartitionSpec::new(
                "other",
                &[],
                "output/temu_template_other.xlsx",
                "All other products (hats, accessories, etc.)",
            ),
        ];

        Self {
            source: SourceLayout::default(),
            template: TemplateLayout::default(),
            mappings,
            fixed_values,
            transforms,
            partition_column: "SKU".to_string(),
            partitions,
            categories: CategoryConfig::default(),
            images: ImageConfig::default(),
            stock: StockConfig::default(),
            variation: VariationConfig::default(),
            update_variant: UpdateVariantConfig::default(),
            output: OutputConfig::default(),
            max_input_file_size: DEFAULT_MAX_INPUT_FILE_SIZE,
        }
    }
}

impl Config {
    /// JSON文字列から設定を読み込み、検証する
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// JSONファイルから設定を読み込み、検証する
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| CatalogError::file_access(path, e))?;
        Self::from_json(&json)
    }

    /// JSON文字列に変換する（整形済み）
    pub fn to_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 設定の整合性を検証する
    ///
    /// # 戻り値
    ///
    /// * `Err(CatalogError::Config)` - 以下のいずれかに該当する場合
    ///   - パーティションが空、キャッチオールが最後にない、または複数ある
    ///   - パーティション名が空または重複している
    ///   - 列の対応に空の列名がある
    ///   - 固定値がカテゴリ列を対象にしている
    ///   - 同じ(ソース列, 出力列)に複数の変換がある
    ///   - テンプレートのデータ開始行がヘッダー行以前にある
    ///   - チャンクサイズが0
    ///   - カテゴリ規則が不正
    pub fn validate(&self) -> Result<(), CatalogError> {
        self.validate_partitions()?;

        for mapping in &self.mappings {
            if mapping.source.trim().is_empty() || mapping.destination.trim().is_empty() {
                return Err(CatalogError::Config(format!(
                    "Column mapping '{}' -> '{}' has an empty column name",
                    mapping.source, mapping.destination
                )));
            }
        }

        for fixed in &self.fixed_values {
            if fixed.column.trim().is_empty() {
                return Err(CatalogError::Config(
                    "Fixed value has an empty column name".to_string(),
                ));
            }
            // カテゴリ列は固定値の後に必ず上書きされる
            if fixed.column == self.categories.column {
                return Err(CatalogError::Config(format!(
                    "Fixed value for '{}' conflicts with category assignment; use categories.default_code instead",
                    fixed.column
                )));
            }
        }

        self.transform_registry()?;
        self.category_engine()?;

        if self.template.data_start_row <= self.template.header_row {
            return Err(CatalogError::Config(format!(
                "Template data_start_row ({}) must be greater than header_row ({})",
                self.template.data_start_row, self.template.header_row
            )));
        }

        if self.output.chunk_size == 0 {
            return Err(CatalogError::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.max_input_file_size == 0 {
            return Err(CatalogError::Config(
                "max_input_file_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_partitions(&self) -> Result<(), CatalogError> {
        let Some(last) = self.partitions.last() else {
            return Err(CatalogError::Config(
                "At least one partition is required".to_string(),
            ));
        };

        if !last.is_catch_all() {
            return Err(CatalogError::Config(format!(
                "The last partition '{}' must be a catch-all (empty prefixes)",
                last.name
            )));
        }

        for (index, spec) in self.partitions.iter().enumerate() {
            if spec.name.trim().is_empty() {
                return Err(CatalogError::Config(
                    "Partition name must not be empty".to_string(),
                ));
            }
            if index + 1 < self.partitions.len() && spec.is_catch_all() {
                return Err(CatalogError::Config(format!(
                    "Catch-all partition '{}' must be declared last",
                    spec.name
                )));
            }
            if spec.prefixes.iter().any(|p| p.is_empty()) {
                return Err(CatalogError::Config(format!(
                    "Partition '{}' has an empty prefix",
                    spec.name
                )));
            }
            if self.partitions[..index].iter().any(|p| p.name == spec.name) {
                return Err(CatalogError::Config(format!(
                    "Duplicate partition name '{}'",
                    spec.name
                )));
            }
        }

        Ok(())
    }

    /// 変換の登録表を構築する
    pub fn transform_registry(&self) -> Result<TransformRegistry, CatalogError> {
        TransformRegistry::from_entries(&self.transforms)
    }

    /// カテゴリ割り当てエンジンを構築する
    pub fn category_engine(&self) -> Result<CategoryEngine, CatalogError> {
        CategoryEngine::new(
            self.categories.rules.clone(),
            self.categories.default_code.clone(),
            self.categories.default_description.clone(),
        )
    }
}

/// 既定のカテゴリ規則（評価順）
pub fn default_category_rules() -> Vec<CategoryRule> {
    const WOMEN: &[&str] = &["women", "female", "ladies", "woman"];

    vec![
        CategoryRule::new(
            "2062",
            "Pet Supplies / Small Animals / Carriers",
            &[
                &["pet", "animal", "dog", "cat", "bird", "hamster", "rabbit", "guinea", "ferret"],
                &["carrier", "crate", "kennel", "bag", "cage", "transport"],
            ],
        ),
        CategoryRule::new(
            "9923",
            "Home & Kitchen / Kitchen & Dining / Kitchen Utensils & Gadgets",
            &[
                &["kitchen", "cooking", "baking", "dining", "food", "chef"],
                &[
                    "utensil", "gadget", "tool", "set", "spatula", "whisk", "opener", "strainer",
                    "grater",
                ],
            ],
        ),
        CategoryRule::new(
            "11809",
            "Home & Kitchen / Bath / Towels / Beach Towels",
            &[
                &["bath", "bathroom", "shower", "beach", "pool", "spa"],
                &["towel", "wrap", "robe", "bath towel", "beach towel"],
            ],
        ),
        CategoryRule::new(
            "19843",
            "Beauty & Personal Care / Foot, Hand & Nail Care / Tools & Accessories",
            &[
                &["nail", "foot", "hand", "spa", "pedicure", "manicure", "beauty"],
                &["tool", "accessory", "slipper", "file", "clipper", "brush", "polish"],
            ],
        ),
        CategoryRule::new(
            "24380",
            "Cell Phones & Accessories / Cases, Holsters & Sleeves",
            &[
                &["phone", "cell", "smartphone", "mobile", "iphone", "android"],
                &["case", "holster", "sleeve", "crossbody", "lanyard", "cover", "protector"],
            ],
        ),
        CategoryRule::new(
            "29264",
            "Clothing, Shoes & Jewelry / Women / Accessories / Belts",
            &[WOMEN, &["belt", "waistband", "strap", "leather belt"]],
        ),
        CategoryRule::new(
            "29290",
            "Clothing, Shoes & Jewelry / Women / Accessories / Scarves & Wraps",
            &[WOMEN, &["scarf", "wrap", "shawl", "stole", "neck scarf"]],
        ),
        CategoryRule::new(
            "29312",
            "Clothing, Shoes & Jewelry / Women / Accessories / Sunglasses & Eyewear",
            &[
                &["eyeglass", "glasses", "sunglasses", "sunglass", "eye", "vision"],
                &["case", "holder", "container", "protector"],
            ],
        ),
        CategoryRule::new(
            "29324",
            "Clothing, Shoes & Jewelry / Women / Accessories / Wallets",
            &[
                WOMEN,
                &["wallet", "card case", "money organizer", "purse", "coin pouch", "billfold"],
            ],
        ),
        CategoryRule::new(
            "29522",
            "Clothing, Shoes & Jewelry / Women / Jewelry / Brooches & Pins",
            &[WOMEN, &["brooch", "pin", "badge", "lapel", "decorative pin"]],
        ),
        CategoryRule::new(
            "29542",
            "Clothing, Shoes & Jewelry / Women / Jewelry / Necklaces",
            &[WOMEN, &["necklace", "pendant", "choker", "chain", "jewelry"]],
        ),
        CategoryRule::new(
            "30988",
            "Clothing, Shoes & Jewelry / Luggage & Travel Gear / Cosmetic Cases",
            &[
                &["cosmetic", "make-up", "makeup", "beauty"],
                &["case", "bag", "holder", "organizer", "travel"],
            ],
        ),
        CategoryRule::new(
            "36256",
            "Sports & Outdoors / Sports / Leisure Sports / Pickleball / Paddles",
            &[
                &["sport", "outdoor", "game", "pickleball", "tennis", "badminton", "paddle"],
                &["paddle", "racket", "ball", "set", "equipment"],
            ],
        ),
        CategoryRule::new(
            "39969",
            "Arts, Crafts & Sewing / Organization / Pen, Pencil & Marker Cases",
            &[
                &["art", "craft", "sewing", "school", "office", "stationery"],
                &["pen", "pencil", "marker", "case", "pouch", "holder", "organizer"],
            ],
        ),
        CategoryRule::new(
            "46208",
            "Books / Children's Books / Education & Reference / Journal Writing",
            &[&[
                "book",
                "children",
                "kids",
                "education",
                "reference",
                "reading",
                "writing",
                "journal",
                "diary",
                "notebook",
            ]],
        ),
        CategoryRule::new("29163", "Tote bags and totes", &[&["tote"]]),
        CategoryRule::new("29164", "Backpacks", &[&["backpack"]]),
        CategoryRule::new("29165", "Wallets", &[&["wallet"]]),
    ]
}
