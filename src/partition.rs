//! Partitioner Module
//!
//! SKUの接頭辞で商品を名前付きのグループに振り分けるモジュール。

use crate::config::PartitionSpec;
use crate::error::CatalogError;

/// パーティション振り分け器
///
/// パーティション定義を宣言順に評価し、SKUがいずれかの接頭辞で始まる
/// 最初のパーティションを返します。接頭辞が複数のパーティションに重複していても
/// 先に宣言されたものが選ばれます。キャッチオールは常に最後に評価されます。
#[derive(Debug, Clone)]
pub struct Partitioner {
    specs: Vec<PartitionSpec>,
}

impl Partitioner {
    /// パーティション定義から振り分け器を構築する
    ///
    /// # 戻り値
    ///
    /// * `Err(CatalogError::Config)` - 定義が空の場合、または最後の定義がキャッチオールでない場合
    pub fn new(specs: Vec<PartitionSpec>) -> Result<Self, CatalogError> {
        match specs.last() {
            Some(last) if last.is_catch_all() => {}
            Some(last) => {
                return Err(CatalogError::Config(format!(
                    "The last partition '{}' must be a catch-all (empty prefixes)",
                    last.name
                )))
            }
            None => {
                return Err(CatalogError::Config(
                    "At least one partition is required".to_string(),
                ))
            }
        }

        if let Some(spec) = specs[..specs.len() - 1].iter().find(|s| s.is_catch_all()) {
            return Err(CatalogError::Config(format!(
                "Catch-all partition '{}' must be declared last",
                spec.name
            )));
        }

        Ok(Self { specs })
    }

    /// SKUが属するパーティションのインデックスを返す
    ///
    /// 接頭辞の比較は大文字・小文字を区別します。SKUの前後の空白は無視されます。
    pub fn assign_index(&self, code: &str) -> usize {
        let code = code.trim();
        self.specs
            .iter()
            .position(|spec| {
                spec.is_catch_all() || spec.prefixes.iter().any(|p| code.starts_with(p.as_str()))
            })
            .unwrap_or(self.specs.len() - 1)
    }

    /// SKUが属するパーティション定義を返す
    pub fn assign(&self, code: &str) -> &PartitionSpec {
        &self.specs[self.assign_index(code)]
    }

    /// 宣言順のパーティション定義
    pub fn specs(&self) -> &[PartitionSpec] {
        &self.specs
    }

    /// 要素をパーティションごとに振り分ける（各パーティション内の順序は保持される）
    pub fn split<T, F>(&self, items: Vec<T>, code_of: F) -> Vec<Vec<T>>
    where
        F: Fn(&T) -> String,
    {
        let mut groups: Vec<Vec<T>> = self.specs.iter().map(|_| Vec::new()).collect();
        for item in items {
            let index = self.assign_index(&code_of(&item));
            groups[index].push(item);
        }
        groups
    }
}
