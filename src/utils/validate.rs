use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid username regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

static BACKUP_FILENAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^backup_\d+\.json$").expect("Invalid backup filename regex"));

pub const COURSE_TITLE_MAX: usize = 100;
pub const COURSE_DESCRIPTION_MAX: usize = 1000;
pub const PASSWORD_MIN: usize = 6;
pub const CHAPTER_TITLE_MAX: usize = 200;
pub const ASSIGNMENT_TITLE_RANGE: (usize, usize) = (2, 100);
pub const ASSIGNMENT_DESCRIPTION_MAX: usize = 2000;
pub const SUBMISSION_CONTENT_MAX: usize = 5000;
pub const GRADE_COMMENT_MAX: usize = 500;

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let len = username.chars().count();
    if !(3..=20).contains(&len) {
        return Err("用户名长度必须在 3 到 20 个字符之间");
    }
    if !USERNAME_RE.is_match(username) {
        return Err("用户名只能包含字母、数字、下划线或连字符");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if !EMAIL_RE.is_match(email) {
        return Err("邮箱格式不正确");
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < PASSWORD_MIN {
        return Err("密码长度至少为 6 个字符");
    }
    Ok(())
}

/// 课程标题、描述与价格
pub fn validate_course_fields(
    title: Option<&str>,
    description: Option<&str>,
    price: Option<f64>,
) -> Result<(), &'static str> {
    if let Some(title) = title {
        if title.trim().is_empty() {
            return Err("课程标题不能为空");
        }
        if title.chars().count() > COURSE_TITLE_MAX {
            return Err("课程标题不能超过 100 个字符");
        }
    }
    if let Some(description) = description
        && description.chars().count() > COURSE_DESCRIPTION_MAX
    {
        return Err("课程描述不能超过 1000 个字符");
    }
    if let Some(price) = price
        && !(price.is_finite() && price >= 0.0)
    {
        return Err("课程价格不能为负数");
    }
    Ok(())
}

/// 章节标题、时长与序号
pub fn validate_chapter_fields(
    title: Option<&str>,
    duration: Option<i32>,
    order: Option<i32>,
) -> Result<(), &'static str> {
    if let Some(title) = title {
        if title.trim().is_empty() {
            return Err("章节标题不能为空");
        }
        if title.chars().count() > CHAPTER_TITLE_MAX {
            return Err("章节标题不能超过 200 个字符");
        }
    }
    if duration.is_some_and(|d| d < 0) {
        return Err("章节时长不能为负数");
    }
    if order.is_some_and(|o| o < 1) {
        return Err("章节序号必须大于 0");
    }
    Ok(())
}

/// 作业标题、描述与总分
pub fn validate_assignment_fields(
    title: Option<&str>,
    description: Option<&str>,
    total_score: Option<f64>,
) -> Result<(), &'static str> {
    if let Some(title) = title {
        let len = title.trim().chars().count();
        if len < ASSIGNMENT_TITLE_RANGE.0 || len > ASSIGNMENT_TITLE_RANGE.1 {
            return Err("作业标题长度必须在 2-100 个字符之间");
        }
    }
    if let Some(description) = description {
        if description.trim().is_empty() {
            return Err("作业描述不能为空");
        }
        if description.chars().count() > ASSIGNMENT_DESCRIPTION_MAX {
            return Err("作业描述不能超过 2000 个字符");
        }
    }
    if let Some(total_score) = total_score
        && !(total_score.is_finite() && total_score > 0.0)
    {
        return Err("作业总分必须大于 0");
    }
    Ok(())
}

/// 备份文件名只允许 backup_<数字>.json
pub fn is_valid_backup_filename(filename: &str) -> bool {
    BACKUP_FILENAME_RE.is_match(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert!(validate_username("bob").is_ok());
        assert!(validate_username("alice_01-x").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("a".repeat(21).as_str()).is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username("张三丰").is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("alice@example").is_err());
        assert!(validate_email("no-at-sign.com").is_err());
    }

    #[test]
    fn test_password_min_length() {
        assert!(validate_password("123456").is_ok());
        assert!(validate_password("12345").is_err());
    }

    #[test]
    fn test_course_fields() {
        assert!(validate_course_fields(Some("Rust"), Some("intro"), Some(0.0)).is_ok());
        assert!(validate_course_fields(Some("  "), None, None).is_err());
        assert!(validate_course_fields(Some(&"x".repeat(101)), None, None).is_err());
        assert!(validate_course_fields(None, Some(&"x".repeat(1001)), None).is_err());
        assert!(validate_course_fields(None, None, Some(-1.0)).is_err());
        assert!(validate_course_fields(None, None, None).is_ok());
    }

    #[test]
    fn test_chapter_fields() {
        assert!(validate_chapter_fields(Some("第一章"), Some(30), Some(1)).is_ok());
        assert!(validate_chapter_fields(Some(""), None, None).is_err());
        assert!(validate_chapter_fields(None, Some(-5), None).is_err());
        assert!(validate_chapter_fields(None, None, Some(0)).is_err());
    }

    #[test]
    fn test_assignment_fields() {
        assert!(validate_assignment_fields(Some("作业一"), Some("完成练习"), Some(100.0)).is_ok());
        assert!(validate_assignment_fields(Some("a"), None, None).is_err());
        assert!(validate_assignment_fields(None, Some("   "), None).is_err());
        assert!(validate_assignment_fields(None, None, Some(0.0)).is_err());
        assert!(validate_assignment_fields(None, None, Some(f64::NAN)).is_err());
    }

    #[test]
    fn test_backup_filename() {
        assert!(is_valid_backup_filename("backup_1700000000.json"));
        assert!(!is_valid_backup_filename("../backup_1.json"));
        assert!(!is_valid_backup_filename("backup_.json"));
        assert!(!is_valid_backup_filename("backup_12.json.bak"));
    }
}
