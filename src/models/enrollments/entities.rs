use serde::{Deserialize, Serialize};
use ts_rs::TS;

define_string_enum! {
    /// 选课状态
    EnrollmentStatus, "选课状态", "enrollment.ts" {
        Active => "active",
        Completed => "completed",
        Dropped => "dropped",
    }
}

// 选课记录
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "enrollment.ts")]
pub struct Enrollment {
    pub id: i64,
    pub course_id: i64,
    pub student_id: i64,
    pub status: EnrollmentStatus,
    /// 0-100，由已完成的学习记录推导
    pub progress: i32,
    pub last_study_time: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Enrollment {
    pub fn is_dropped(&self) -> bool {
        self.status == EnrollmentStatus::Dropped
    }
}

// 已完成章节（由学习记录推导，不单独存储）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "enrollment.ts")]
pub struct CompletedChapter {
    pub chapter_id: i64,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// 选课进度：已完成章节数 / 总章节数，四舍五入为整数百分比；没有章节时为 0
pub fn compute_progress(completed: u64, total: u64) -> i32 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    ((completed as f64 / total as f64) * 100.0).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_progress() {
        assert_eq!(compute_progress(0, 0), 0);
        assert_eq!(compute_progress(0, 2), 0);
        assert_eq!(compute_progress(1, 2), 50);
        assert_eq!(compute_progress(2, 2), 100);
        assert_eq!(compute_progress(1, 3), 33);
        assert_eq!(compute_progress(2, 3), 67);
        // 完成数不会超过总数
        assert_eq!(compute_progress(5, 3), 100);
    }
}
