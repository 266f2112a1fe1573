pub mod ai_usage;
pub mod subscription;
