// ==========================================
// O2O 门店商品分析 - 分析参数配置
// ==========================================
// 职责: 阈值 / 排除分类 / 成本预警 / 消费场景 / 列映射
// 加载: 默认值 或 JSON 文件（缺省字段回落默认值）
// ==========================================

use crate::config::column_mapping::ColumnMapping;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {message}")]
    Read { path: String, message: String },

    #[error("配置文件解析失败 ({path}): {message}")]
    Parse { path: String, message: String },

    #[error("配置值无效: {0}")]
    Invalid(String),
}

/// 消费场景（场景名 + 关键词）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionScenario {
    pub name: String,
    pub keywords: Vec<String>,
}

// ==========================================
// AnalysisConfig - 分析参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// 活动商品折扣门槛（含），默认 0.10
    pub activity_discount_threshold: f64,

    /// 爆品折扣门槛（含），默认 0.70
    pub hot_discount_threshold: f64,

    /// 排除的分类（店铺管理类非商品行）
    pub excluded_category: String,

    /// 高毛利门槛（含），默认 0.30
    pub high_margin_threshold: f64,

    /// 低毛利预警门槛（不含），默认 0.10
    pub low_margin_threshold: f64,

    /// 高毛利商品输出上限
    pub high_margin_limit: usize,

    /// 低毛利预警输出上限
    pub low_margin_limit: usize,

    /// 销售额对账容差（元）
    pub revenue_tolerance: f64,

    /// 消费场景关键词
    pub consumption_scenarios: Vec<ConsumptionScenario>,

    /// 列映射
    pub column_mapping: ColumnMapping,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        fn scenario(name: &str, keywords: &[&str]) -> ConsumptionScenario {
            ConsumptionScenario {
                name: name.to_string(),
                keywords: keywords.iter().map(|s| s.to_string()).collect(),
            }
        }

        Self {
            activity_discount_threshold: 0.10,
            hot_discount_threshold: 0.70,
            excluded_category: "店铺管理".to_string(),
            high_margin_threshold: 0.30,
            low_margin_threshold: 0.10,
            high_margin_limit: 50,
            low_margin_limit: 100,
            revenue_tolerance: 0.01,
            consumption_scenarios: vec![
                scenario("早餐快手", &["早餐", "牛奶", "面包", "麦片", "鸡蛋"]),
                scenario("加班能量补给", &["咖啡", "能量饮料", "巧克力", "饼干", "能量棒"]),
                scenario("家庭囤货", &["大包装", "家庭装", "组合装", "箱", "量贩"]),
                scenario("聚会零食", &["薯片", "膨化", "糖果", "坚果", "汽水", "啤酒"]),
            ],
            column_mapping: ColumnMapping::default(),
        }
    }
}

impl AnalysisConfig {
    /// 从 JSON 文件加载配置
    ///
    /// # 参数
    /// - path: JSON 文件路径
    ///
    /// # 返回
    /// - Ok(AnalysisConfig): 已校验的配置
    /// - Err(ConfigError): 读取/解析/校验失败
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let config: AnalysisConfig =
            serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        config.validate()?;
        info!(path = %path.display(), "分析配置已加载");
        Ok(config)
    }

    /// 校验配置取值
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_checks = [
            ("activity_discount_threshold", self.activity_discount_threshold),
            ("hot_discount_threshold", self.hot_discount_threshold),
            ("high_margin_threshold", self.high_margin_threshold),
            ("low_margin_threshold", self.low_margin_threshold),
        ];
        for (key, value) in unit_checks {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} 必须位于 [0, 1]，实际 {}",
                    key, value
                )));
            }
        }

        if !(self.revenue_tolerance >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "revenue_tolerance 必须 ≥ 0，实际 {}",
                self.revenue_tolerance
            )));
        }

        if self.low_margin_threshold > self.high_margin_threshold {
            return Err(ConfigError::Invalid(
                "low_margin_threshold 不能大于 high_margin_threshold".to_string(),
            ));
        }

        Ok(())
    }

    /// 消费场景转为 (场景名, 关键词) 列表
    pub fn scenario_keywords(&self) -> Vec<(String, Vec<String>)> {
        self.consumption_scenarios
            .iter()
            .map(|s| (s.name.clone(), s.keywords.clone()))
            .collect()
    }
}
