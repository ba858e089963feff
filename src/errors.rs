use std::fmt;

#[derive(Debug, Clone)]
pub enum MailshotError {
    StoreConnection(String),
    StoreOperation(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
    Validation(String),
    NotFound(String),
    InvalidState(String),
    ZeroRecipients(String),
    Serialization(String),
    MailTransport(String),
    JobQueue(String),
}

impl MailshotError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            MailshotError::StoreConnection(_) => "E001",
            MailshotError::StoreOperation(_) => "E002",
            MailshotError::DatabaseConfig(_) => "E003",
            MailshotError::DatabaseConnection(_) => "E004",
            MailshotError::DatabaseOperation(_) => "E005",
            MailshotError::FileOperation(_) => "E006",
            MailshotError::Validation(_) => "E007",
            MailshotError::NotFound(_) => "E008",
            MailshotError::InvalidState(_) => "E009",
            MailshotError::ZeroRecipients(_) => "E010",
            MailshotError::Serialization(_) => "E011",
            MailshotError::MailTransport(_) => "E012",
            MailshotError::JobQueue(_) => "E013",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            MailshotError::StoreConnection(_) => "Store Connection Error",
            MailshotError::StoreOperation(_) => "Store Operation Error",
            MailshotError::DatabaseConfig(_) => "Database Configuration Error",
            MailshotError::DatabaseConnection(_) => "Database Connection Error",
            MailshotError::DatabaseOperation(_) => "Database Operation Error",
            MailshotError::FileOperation(_) => "File Operation Error",
            MailshotError::Validation(_) => "Validation Error",
            MailshotError::NotFound(_) => "Resource Not Found",
            MailshotError::InvalidState(_) => "Invalid State Transition",
            MailshotError::ZeroRecipients(_) => "Zero Recipients",
            MailshotError::Serialization(_) => "Serialization Error",
            MailshotError::MailTransport(_) => "Mail Transport Error",
            MailshotError::JobQueue(_) => "Job Queue Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            MailshotError::StoreConnection(msg) => msg,
            MailshotError::StoreOperation(msg) => msg,
            MailshotError::DatabaseConfig(msg) => msg,
            MailshotError::DatabaseConnection(msg) => msg,
            MailshotError::DatabaseOperation(msg) => msg,
            MailshotError::FileOperation(msg) => msg,
            MailshotError::Validation(msg) => msg,
            MailshotError::NotFound(msg) => msg,
            MailshotError::InvalidState(msg) => msg,
            MailshotError::ZeroRecipients(msg) => msg,
            MailshotError::Serialization(msg) => msg,
            MailshotError::MailTransport(msg) => msg,
            MailshotError::JobQueue(msg) => msg,
        }
    }

    /// 调用方可见的业务错误（不重试）
    pub fn is_domain_error(&self) -> bool {
        matches!(
            self,
            MailshotError::InvalidState(_)
                | MailshotError::ZeroRecipients(_)
                | MailshotError::NotFound(_)
                | MailshotError::Validation(_)
        )
    }

    /// HTTP 状态码映射
    pub fn http_status(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            MailshotError::InvalidState(_) => StatusCode::CONFLICT,
            MailshotError::ZeroRecipients(_) | MailshotError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            MailshotError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for MailshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for MailshotError {}

// 便捷的构造函数
impl MailshotError {
    pub fn store_connection<T: Into<String>>(msg: T) -> Self {
        MailshotError::StoreConnection(msg.into())
    }

    pub fn store_operation<T: Into<String>>(msg: T) -> Self {
        MailshotError::StoreOperation(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        MailshotError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        MailshotError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        MailshotError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        MailshotError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        MailshotError::Validation(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        MailshotError::NotFound(msg.into())
    }

    pub fn invalid_state<T: Into<String>>(msg: T) -> Self {
        MailshotError::InvalidState(msg.into())
    }

    pub fn zero_recipients<T: Into<String>>(msg: T) -> Self {
        MailshotError::ZeroRecipients(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        MailshotError::Serialization(msg.into())
    }

    pub fn mail_transport<T: Into<String>>(msg: T) -> Self {
        MailshotError::MailTransport(msg.into())
    }

    pub fn job_queue<T: Into<String>>(msg: T) -> Self {
        MailshotError::JobQueue(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for MailshotError {
    fn from(err: sea_orm::DbErr) -> Self {
        MailshotError::DatabaseOperation(err.to_string())
    }
}

impl From<redis::RedisError> for MailshotError {
    fn from(err: redis::RedisError) -> Self {
        MailshotError::StoreOperation(err.to_string())
    }
}

impl From<std::io::Error> for MailshotError {
    fn from(err: std::io::Error) -> Self {
        MailshotError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for MailshotError {
    fn from(err: serde_json::Error) -> Self {
        MailshotError::Serialization(err.to_string())
    }
}

impl From<lettre::error::Error> for MailshotError {
    fn from(err: lettre::error::Error) -> Self {
        MailshotError::MailTransport(format!("failed to build message: {}", err))
    }
}

impl From<lettre::address::AddressError> for MailshotError {
    fn from(err: lettre::address::AddressError) -> Self {
        MailshotError::Validation(format!("invalid mailbox: {}", err))
    }
}

impl From<lettre::transport::smtp::Error> for MailshotError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        MailshotError::MailTransport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MailshotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let errors = [
            MailshotError::store_connection("x"),
            MailshotError::store_operation("x"),
            MailshotError::database_config("x"),
            MailshotError::database_connection("x"),
            MailshotError::database_operation("x"),
            MailshotError::file_operation("x"),
            MailshotError::validation("x"),
            MailshotError::not_found("x"),
            MailshotError::invalid_state("x"),
            MailshotError::zero_recipients("x"),
            MailshotError::serialization("x"),
            MailshotError::mail_transport("x"),
            MailshotError::job_queue("x"),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_domain_errors() {
        assert!(MailshotError::invalid_state("already sending").is_domain_error());
        assert!(MailshotError::zero_recipients("empty").is_domain_error());
        assert!(!MailshotError::store_operation("boom").is_domain_error());
    }

    #[test]
    fn test_http_status() {
        use actix_web::http::StatusCode;
        assert_eq!(
            MailshotError::invalid_state("x").http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            MailshotError::zero_recipients("x").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            MailshotError::not_found("x").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            MailshotError::database_operation("x").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_format_simple() {
        let err = MailshotError::invalid_state("Campaign already sending.");
        assert_eq!(
            err.format_simple(),
            "Invalid State Transition: Campaign already sending."
        );
        assert_eq!(err.to_string(), err.format_simple());
    }
}
