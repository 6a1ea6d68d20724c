use serde::{Deserialize, Serialize};
use ts_rs::TS;

define_string_enum! {
    /// 课程状态
    CourseStatus, "课程状态", "course.ts" {
        Draft => "draft",
        Published => "published",
        Closed => "closed",
    }
}

impl CourseStatus {
    /// 允许的状态迁移：
    /// draft -> published, published -> closed, closed -> published, published -> draft
    pub fn can_transition_to(&self, next: CourseStatus) -> bool {
        matches!(
            (self, next),
            (CourseStatus::Draft, CourseStatus::Published)
                | (CourseStatus::Published, CourseStatus::Closed)
                | (CourseStatus::Closed, CourseStatus::Published)
                | (CourseStatus::Published, CourseStatus::Draft)
        )
    }
}

define_string_enum! {
    /// 课程分类
    CourseCategory, "课程分类", "course.ts" {
        Programming => "programming",
        Design => "design",
        Business => "business",
        Language => "language",
        Other => "other",
    }
}

define_string_enum! {
    /// 课程难度
    CourseLevel, "课程难度", "course.ts" {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
}

// 课程实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub teacher_id: i64,
    pub cover_image: Option<String>,
    pub category: CourseCategory,
    pub level: CourseLevel,
    pub price: f64,
    pub status: CourseStatus,
    pub student_count: i32,
    pub rating: f64,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Course {
    /// 发布前置条件，返回缺失项
    pub fn publish_blockers(&self, chapter_count: u64) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.description.trim().is_empty() {
            missing.push("description");
        }
        if self.cover_image.as_deref().is_none_or(str::is_empty) {
            missing.push("cover_image");
        }
        if chapter_count == 0 {
            missing.push("chapters");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use CourseStatus::*;
        assert!(Draft.can_transition_to(Published));
        assert!(Published.can_transition_to(Closed));
        assert!(Closed.can_transition_to(Published));
        assert!(Published.can_transition_to(Draft));

        assert!(!Draft.can_transition_to(Closed));
        assert!(!Closed.can_transition_to(Draft));
        assert!(!Draft.can_transition_to(Draft));
    }

    #[test]
    fn test_publish_blockers() {
        let now = chrono::Utc::now();
        let mut course = Course {
            id: 1,
            title: "Rust 入门".into(),
            description: "".into(),
            teacher_id: 2,
            cover_image: None,
            category: CourseCategory::Programming,
            level: CourseLevel::Beginner,
            price: 0.0,
            status: CourseStatus::Draft,
            student_count: 0,
            rating: 0.0,
            published_at: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(
            course.publish_blockers(0),
            vec!["description", "cover_image", "chapters"]
        );

        course.description = "从零开始".into();
        course.cover_image = Some("/api/uploads/covers/a.png".into());
        assert!(course.publish_blockers(1).is_empty());
    }
}
