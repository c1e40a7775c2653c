use serde::{Deserialize, Serialize};
use sqlx::{SqliteExecutor, SqlitePool};
use uuid::Uuid;

/// Roles are granted by the actions that imply them: enrolling makes a
/// student, a staff record makes a teacher or a manager.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    strum::Display,
    strum::EnumString,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Student,
    Teacher,
    Manager,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Permission {
    SubmitAnswer,
    ManageAssignments,
    GradeAssignments,
    FinishCourses,
    ViewEnrolls,
    ManageCourses,
    ManageTeachers,
}

impl Role {
    #[must_use]
    pub const fn permissions(self) -> &'static [Permission] {
        match self {
            Self::Student => &[Permission::SubmitAnswer],
            Self::Teacher => &[
                Permission::ManageAssignments,
                Permission::GradeAssignments,
                Permission::FinishCourses,
                Permission::ViewEnrolls,
            ],
            Self::Manager => &[
                Permission::ManageAssignments,
                Permission::FinishCourses,
                Permission::ViewEnrolls,
                Permission::ManageCourses,
                Permission::ManageTeachers,
            ],
        }
    }

    #[must_use]
    pub fn grants(self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub async fn for_user(db: &SqlitePool, user_id: Uuid) -> sqlx::Result<Vec<Self>> {
        sqlx::query_scalar::<_, Self>("SELECT role FROM user_roles WHERE user_id = ? ORDER BY role")
            .bind(user_id)
            .fetch_all(db)
            .await
    }

    /// Idempotent.
    pub async fn grant(self, db: impl SqliteExecutor<'_>, user_id: Uuid) -> sqlx::Result<()> {
        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES (?, ?) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(self)
            .execute(db)
            .await?;

        Ok(())
    }
}

/// Superusers hold every permission; everyone else the union of their roles.
#[must_use]
pub fn has_perm(is_superuser: bool, roles: &[Role], permission: Permission) -> bool {
    is_superuser || roles.iter().any(|role| role.grants(permission))
}

/// Whether one of the user's roles that grants `permission` also supervises
/// the course instance.
pub async fn within_scope(
    db: &SqlitePool,
    user_id: Uuid,
    roles: &[Role],
    permission: Permission,
    course_instance_id: Uuid,
) -> sqlx::Result<bool> {
    for role in roles.iter().filter(|role| role.grants(permission)) {
        let supervised = match role {
            Role::Student => false,
            Role::Teacher => {
                sqlx::query_scalar::<_, bool>(
                    r"SELECT EXISTS (
                        SELECT 1 FROM teacher_course_instances tci
                        JOIN staff_workers s ON s.id = tci.staff_id
                        WHERE s.user_id = ?1 AND s.kind = 'teacher'
                        AND tci.course_instance_id = ?2
                    )",
                )
                .bind(user_id)
                .bind(course_instance_id)
                .fetch_one(db)
                .await?
            }
            Role::Manager => {
                sqlx::query_scalar::<_, bool>(
                    r"SELECT EXISTS (
                        SELECT 1 FROM staff_workers s
                        WHERE s.user_id = ?1 AND s.kind = 'manager'
                        AND (
                            EXISTS (
                                SELECT 1 FROM manager_course_instances mci
                                WHERE mci.staff_id = s.id AND mci.course_instance_id = ?2
                            )
                            OR EXISTS (
                                SELECT 1 FROM manager_courses mc
                                JOIN course_instances ci ON ci.course_id = mc.course_id
                                WHERE mc.staff_id = s.id AND ci.id = ?2
                            )
                        )
                    )",
                )
                .bind(user_id)
                .bind(course_instance_id)
                .fetch_one(db)
                .await?
            }
        };

        if supervised {
            return Ok(true);
        }
    }

    Ok(false)
}
