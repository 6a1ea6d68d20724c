use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 用户表
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::Role).string().not_null())
                    .col(ColumnDef::new(Users::Status).string().not_null())
                    .col(ColumnDef::new(Users::Name).string().null())
                    .col(ColumnDef::new(Users::AvatarUrl).string().null())
                    .col(ColumnDef::new(Users::LastLogin).big_integer().null())
                    .col(ColumnDef::new(Users::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 用户设置表（每个用户至多一行）
        manager
            .create_table(
                Table::create()
                    .table(UserSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserSettings::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserSettings::UserId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(UserSettings::NotifyEmail)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(UserSettings::NotifyAssignment)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(UserSettings::NotifyExam)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(UserSettings::Theme).string().not_null())
                    .col(
                        ColumnDef::new(UserSettings::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(UserSettings::Table, UserSettings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 课程表
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Courses::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Courses::TeacherId).big_integer().not_null())
                    .col(ColumnDef::new(Courses::Title).string().not_null())
                    .col(ColumnDef::new(Courses::Description).text().not_null())
                    .col(ColumnDef::new(Courses::CoverImage).string().null())
                    .col(ColumnDef::new(Courses::Category).string().not_null())
                    .col(ColumnDef::new(Courses::Level).string().not_null())
                    .col(
                        ColumnDef::new(Courses::Price)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Courses::Status).string().not_null())
                    .col(
                        ColumnDef::new(Courses::StudentCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Courses::Rating)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Courses::PublishedAt).big_integer().null())
                    .col(ColumnDef::new(Courses::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Courses::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Courses::Table, Courses::TeacherId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 章节表
        manager
            .create_table(
                Table::create()
                    .table(Chapters::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Chapters::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Chapters::CourseId).big_integer().not_null())
                    .col(ColumnDef::new(Chapters::Title).string().not_null())
                    .col(ColumnDef::new(Chapters::Description).text().null())
                    .col(ColumnDef::new(Chapters::SortOrder).integer().not_null())
                    .col(ColumnDef::new(Chapters::Content).text().null())
                    .col(
                        ColumnDef::new(Chapters::Duration)
                            .integer()
                            .not_null()
                            .default(30),
                    )
                    .col(ColumnDef::new(Chapters::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Chapters::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Chapters::Table, Chapters::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 章节资源表
        manager
            .create_table(
                Table::create()
                    .table(ChapterResources::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChapterResources::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ChapterResources::ChapterId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ChapterResources::Title).string().not_null())
                    .col(ColumnDef::new(ChapterResources::Url).string().not_null())
                    .col(
                        ColumnDef::new(ChapterResources::ResourceType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChapterResources::FileName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ChapterResources::Size).big_integer().not_null())
                    .col(ColumnDef::new(ChapterResources::Duration).integer().null())
                    .col(
                        ColumnDef::new(ChapterResources::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ChapterResources::Table, ChapterResources::ChapterId)
                            .to(Chapters::Table, Chapters::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 选课表
        manager
            .create_table(
                Table::create()
                    .table(Enrollments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Enrollments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Enrollments::CourseId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Enrollments::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Enrollments::Status).string().not_null())
                    .col(
                        ColumnDef::new(Enrollments::Progress)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Enrollments::LastStudyTime)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Enrollments::CompletedAt).big_integer().null())
                    .col(
                        ColumnDef::new(Enrollments::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Enrollments::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Enrollments::Table, Enrollments::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Enrollments::Table, Enrollments::StudentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 学习记录表
        manager
            .create_table(
                Table::create()
                    .table(StudyRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudyRecords::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StudyRecords::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudyRecords::CourseId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudyRecords::ChapterId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StudyRecords::Status).string().not_null())
                    .col(
                        ColumnDef::new(StudyRecords::Progress)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(StudyRecords::LastStudyTime)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudyRecords::CompletedAt)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(StudyRecords::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudyRecords::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StudyRecords::Table, StudyRecords::StudentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StudyRecords::Table, StudyRecords::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StudyRecords::Table, StudyRecords::ChapterId)
                            .to(Chapters::Table, Chapters::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 作业表
        manager
            .create_table(
                Table::create()
                    .table(Assignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Assignments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Assignments::CourseId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assignments::CreatedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Assignments::Title).string().not_null())
                    .col(ColumnDef::new(Assignments::Description).text().not_null())
                    .col(ColumnDef::new(Assignments::Deadline).big_integer().not_null())
                    .col(
                        ColumnDef::new(Assignments::TotalScore)
                            .double()
                            .not_null()
                            .default(100.0),
                    )
                    .col(ColumnDef::new(Assignments::Status).string().not_null())
                    .col(
                        ColumnDef::new(Assignments::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assignments::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Assignments::Table, Assignments::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 作业附件表
        manager
            .create_table(
                Table::create()
                    .table(AssignmentAttachments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AssignmentAttachments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AssignmentAttachments::AssignmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentAttachments::Title)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentAttachments::Url)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentAttachments::FileType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentAttachments::FileName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentAttachments::Size)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AssignmentAttachments::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                AssignmentAttachments::Table,
                                AssignmentAttachments::AssignmentId,
                            )
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 提交表
        manager
            .create_table(
                Table::create()
                    .table(Submissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Submissions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Submissions::AssignmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Submissions::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Submissions::Content).text().not_null())
                    .col(ColumnDef::new(Submissions::Score).double().null())
                    .col(ColumnDef::new(Submissions::Comment).text().null())
                    .col(ColumnDef::new(Submissions::Status).string().not_null())
                    .col(ColumnDef::new(Submissions::GradedBy).big_integer().null())
                    .col(
                        ColumnDef::new(Submissions::SubmitTime)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Submissions::GradedAt).big_integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Submissions::Table, Submissions::AssignmentId)
                            .to(Assignments::Table, Assignments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Submissions::Table, Submissions::StudentId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 提交附件表
        manager
            .create_table(
                Table::create()
                    .table(SubmissionAttachments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubmissionAttachments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SubmissionAttachments::SubmissionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubmissionAttachments::Title)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubmissionAttachments::Url)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubmissionAttachments::FileType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubmissionAttachments::FileName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubmissionAttachments::Size)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SubmissionAttachments::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                SubmissionAttachments::Table,
                                SubmissionAttachments::SubmissionId,
                            )
                            .to(Submissions::Table, Submissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 唯一约束
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uk_courses_teacher_title")
                    .table(Courses::Table)
                    .col(Courses::TeacherId)
                    .col(Courses::Title)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uk_chapters_course_order")
                    .table(Chapters::Table)
                    .col(Chapters::CourseId)
                    .col(Chapters::SortOrder)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uk_study_records_student_chapter")
                    .table(StudyRecords::Table)
                    .col(StudyRecords::StudentId)
                    .col(StudyRecords::ChapterId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uk_submissions_assignment_student")
                    .table(Submissions::Table)
                    .col(Submissions::AssignmentId)
                    .col(Submissions::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 每个学生在一门课程中只有一条选课记录，退课后重新选课复用该记录
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uk_enrollments_course_student")
                    .table(Enrollments::Table)
                    .col(Enrollments::CourseId)
                    .col(Enrollments::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 查询索引

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_study_records_course_student")
                    .table(StudyRecords::Table)
                    .col(StudyRecords::CourseId)
                    .col(StudyRecords::StudentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assignments_course_id")
                    .table(Assignments::Table)
                    .col(Assignments::CourseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_courses_status")
                    .table(Courses::Table)
                    .col(Courses::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        manager
            .drop_table(Table::drop().table(SubmissionAttachments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Submissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AssignmentAttachments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Assignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StudyRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Enrollments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ChapterResources::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Chapters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserSettings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    Role,
    Status,
    Name,
    AvatarUrl,
    LastLogin,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum UserSettings {
    #[sea_orm(iden = "user_settings")]
    Table,
    Id,
    UserId,
    NotifyEmail,
    NotifyAssignment,
    NotifyExam,
    Theme,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Courses {
    #[sea_orm(iden = "courses")]
    Table,
    Id,
    TeacherId,
    Title,
    Description,
    CoverImage,
    Category,
    Level,
    Price,
    Status,
    StudentCount,
    Rating,
    PublishedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Chapters {
    #[sea_orm(iden = "chapters")]
    Table,
    Id,
    CourseId,
    Title,
    Description,
    SortOrder,
    Content,
    Duration,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ChapterResources {
    #[sea_orm(iden = "chapter_resources")]
    Table,
    Id,
    ChapterId,
    Title,
    Url,
    ResourceType,
    FileName,
    Size,
    Duration,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Enrollments {
    #[sea_orm(iden = "enrollments")]
    Table,
    Id,
    CourseId,
    StudentId,
    Status,
    Progress,
    LastStudyTime,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum StudyRecords {
    #[sea_orm(iden = "study_records")]
    Table,
    Id,
    StudentId,
    CourseId,
    ChapterId,
    Status,
    Progress,
    LastStudyTime,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Assignments {
    #[sea_orm(iden = "assignments")]
    Table,
    Id,
    CourseId,
    CreatedBy,
    Title,
    Description,
    Deadline,
    TotalScore,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum AssignmentAttachments {
    #[sea_orm(iden = "assignment_attachments")]
    Table,
    Id,
    AssignmentId,
    Title,
    Url,
    FileType,
    FileName,
    Size,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Submissions {
    #[sea_orm(iden = "submissions")]
    Table,
    Id,
    AssignmentId,
    StudentId,
    Content,
    Score,
    Comment,
    Status,
    GradedBy,
    SubmitTime,
    GradedAt,
}

#[derive(DeriveIden)]
enum SubmissionAttachments {
    #[sea_orm(iden = "submission_attachments")]
    Table,
    Id,
    SubmissionId,
    Title,
    Url,
    FileType,
    FileName,
    Size,
    CreatedAt,
}
