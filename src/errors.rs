//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_learnhub_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum LearnHubError {
            $($variant(String),)*
        }

        impl LearnHubError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(LearnHubError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(LearnHubError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(LearnHubError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl LearnHubError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        LearnHubError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_learnhub_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    DatabaseConfig("E002", "Database Configuration Error"),
    DatabaseConnection("E003", "Database Connection Error"),
    DatabaseOperation("E004", "Database Operation Error"),
    FileOperation("E005", "File Operation Error"),
    Validation("E006", "Validation Error"),
    NotFound("E007", "Resource Not Found"),
    Serialization("E008", "Serialization Error"),
    DateParse("E009", "Date Parse Error"),
    Authentication("E010", "Authentication Error"),
    Authorization("E011", "Authorization Error"),
    Conflict("E012", "Conflict Error"),
    InvalidState("E013", "Invalid State Error"),
    Upload("E014", "Upload Error"),
}

impl LearnHubError {
    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 是否属于服务端内部错误（需要记录日志并对客户端隐藏细节）
    pub fn is_internal(&self) -> bool {
        !matches!(
            self,
            LearnHubError::Validation(_)
                | LearnHubError::NotFound(_)
                | LearnHubError::Authentication(_)
                | LearnHubError::Authorization(_)
                | LearnHubError::Conflict(_)
                | LearnHubError::InvalidState(_)
                | LearnHubError::Upload(_)
        )
    }
}

impl fmt::Display for LearnHubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LearnHubError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for LearnHubError {
    fn from(err: sea_orm::DbErr) -> Self {
        LearnHubError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for LearnHubError {
    fn from(err: std::io::Error) -> Self {
        LearnHubError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for LearnHubError {
    fn from(err: serde_json::Error) -> Self {
        LearnHubError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for LearnHubError {
    fn from(err: chrono::ParseError) -> Self {
        LearnHubError::DateParse(err.to_string())
    }
}

/// 数据库错误分类：唯一约束冲突转为 Conflict，其余为 DatabaseOperation
pub fn classify_db_err(err: sea_orm::DbErr, context: &str) -> LearnHubError {
    match err.sql_err() {
        Some(sea_orm::SqlErr::UniqueConstraintViolation(detail)) => {
            LearnHubError::conflict(format!("{context}: 记录已存在 ({detail})"))
        }
        _ => LearnHubError::database_operation(format!("{context}: {err}")),
    }
}

pub type Result<T> = std::result::Result<T, LearnHubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(LearnHubError::cache_connection("test").code(), "E001");
        assert_eq!(LearnHubError::database_config("test").code(), "E002");
        assert_eq!(LearnHubError::validation("test").code(), "E006");
        assert_eq!(LearnHubError::conflict("test").code(), "E012");
        assert_eq!(LearnHubError::upload("test").code(), "E014");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            LearnHubError::invalid_state("test").error_type(),
            "Invalid State Error"
        );
        assert_eq!(
            LearnHubError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_error_message() {
        let err = LearnHubError::not_found("课程不存在");
        assert_eq!(err.message(), "课程不存在");
    }

    #[test]
    fn test_format_simple() {
        let err = LearnHubError::validation("Invalid score");
        let formatted = err.format_simple();
        assert!(formatted.contains("Validation Error"));
        assert!(formatted.contains("Invalid score"));
    }

    #[test]
    fn test_internal_classification() {
        assert!(LearnHubError::database_operation("x").is_internal());
        assert!(LearnHubError::file_operation("x").is_internal());
        assert!(!LearnHubError::conflict("x").is_internal());
        assert!(!LearnHubError::authorization("x").is_internal());
    }

    #[test]
    fn test_classify_plain_db_error() {
        let err = classify_db_err(sea_orm::DbErr::Custom("boom".into()), "创建课程失败");
        assert_eq!(err.code(), "E004");
        assert!(err.message().contains("创建课程失败"));
    }
}
