// ==========================================
// 尺寸检验系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository/Engine错误为用户友好的错误消息
// 红线: 错误信息必须包含显式原因
// ==========================================

use crate::engine::error::WorkflowError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 用户可修正错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("实测值未录入完整: {missing:?}")]
    IncompleteInput { missing: Vec<String> },

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    /// 可重试: 会话停留在 ACQUIRING
    #[error("测量点获取失败: {0}")]
    ExtractionFailed(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 WorkflowError 转换
// ==========================================
impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::IncompleteInput { missing } => ApiError::IncompleteInput { missing },
            WorkflowError::UnknownPoint(id) => ApiError::NotFound(format!("测量点{}不存在", id)),
            WorkflowError::UnknownModel(model) => {
                ApiError::NotFound(format!("型号{}未登记测量计划", model))
            }
            WorkflowError::InvalidMeasurement { .. } | WorkflowError::EmptyModel => {
                ApiError::InvalidInput(err.to_string())
            }
            WorkflowError::ExtractionFailure(msg) => ApiError::ExtractionFailed(msg),
            WorkflowError::InvalidPoint { .. } | WorkflowError::DuplicatePoint(_) => {
                ApiError::ValidationError(err.to_string())
            }
            WorkflowError::EmptyBatch
            | WorkflowError::UndecidedPoints(_)
            | WorkflowError::NotCompleted(_) => ApiError::BusinessRuleViolation(err.to_string()),
            WorkflowError::InvalidStateTransition { from, to } => ApiError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            },
            WorkflowError::AdjudicationFailure(msg) => ApiError::InternalError(msg),
            WorkflowError::ArchiveFailure(source) => match source.downcast::<RepositoryError>() {
                Ok(repo_err) => ApiError::from(repo_err),
                Err(other) => ApiError::Other(other),
            },
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SessionState;

    #[test]
    fn test_workflow_error_conversion() {
        let err: ApiError = WorkflowError::IncompleteInput {
            missing: vec!["P1".to_string()],
        }
        .into();
        assert!(matches!(err, ApiError::IncompleteInput { ref missing } if missing == &["P1".to_string()]));

        let err: ApiError = WorkflowError::InvalidStateTransition {
            from: SessionState::Idle,
            to: SessionState::Validating,
        }
        .into();
        match err {
            ApiError::InvalidStateTransition { from, to } => {
                assert_eq!(from, "IDLE");
                assert_eq!(to, "VALIDATING");
            }
            other => panic!("Expected InvalidStateTransition, got {:?}", other),
        }

        let err: ApiError = WorkflowError::UnknownModel("X1".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_archive_failure_unwraps_repository_error() {
        let source = anyhow::Error::new(RepositoryError::UniqueConstraintViolation(
            "inspection_record.session_id".to_string(),
        ));
        let err: ApiError = WorkflowError::ArchiveFailure(source).into();
        assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
    }
}
