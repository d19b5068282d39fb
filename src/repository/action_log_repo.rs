// ==========================================
// 尺寸检验系统 - 操作日志数据仓储
// ==========================================
// 对齐: action_log 表
// 红线: 归档与裁决分歧必须记录
// ==========================================

mod core;
mod queries;


pub use core::ActionLogRepository;
