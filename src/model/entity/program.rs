use crate::domain::ProgramTree;
use crate::impl_paginatable_for;
use crate::model::access::HasOwner;
use crate::model::repo::ResourceTyped;
use crate::model::{ModelManager, error::DatabaseResult, repo::CrudRepository};
use crate::web::AuthenticatedUser;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// A course: an ordered list of modules a learner can enroll in.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, utoipa::ToSchema)]
pub struct Program {
    id: Uuid,
    author_id: Uuid,
    title: String,
    description: String,
    category: String,
    instructor: String,
    instructor_avatar: Option<String>,
    image: Option<String>,
    level: String,
    /// Major currency units.
    price: f64,
    rating: f64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ProgramCreate {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub instructor: String,
    pub instructor_avatar: Option<String>,
    pub image: Option<String>,
    pub level: Option<String>,
    #[serde(default)]
    pub price: f64,
    pub rating: Option<f64>,
    pub is_active: Option<bool>,
}

/// Catalog filters, both matched case-insensitively as substrings.
#[derive(Debug, Clone, Default)]
pub struct ProgramFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ResourceTyped for Program {
    fn get_resource_type() -> crate::model::ResourceType {
        crate::model::ResourceType::Program
    }
}

impl Program {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn author_id(&self) -> Uuid {
        self.author_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }
}

#[async_trait]
impl CrudRepository<Program, ProgramCreate, Uuid> for Program {
    async fn create(
        mm: &ModelManager,
        actor: &AuthenticatedUser,
        data: ProgramCreate,
    ) -> DatabaseResult<Self> {
        let created = sqlx::query_as(
            r#"
            INSERT INTO programs
                (id, author_id, title, description, category, instructor,
                 instructor_avatar, image, level, price, rating, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor.user_id())
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.category)
        .bind(&data.instructor)
        .bind(&data.instructor_avatar)
        .bind(&data.image)
        .bind(data.level.as_deref().unwrap_or("beginner"))
        .bind(data.price)
        .bind(data.rating.unwrap_or(0.0))
        .bind(data.is_active.unwrap_or(true))
        .fetch_one(mm.executor())
        .await?;

        Ok(created)
    }

    async fn update(
        self,
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        data: ProgramCreate,
    ) -> DatabaseResult<Self> {
        let updated = sqlx::query_as(
            r#"
            UPDATE programs SET
                title = $1, description = $2, category = $3, instructor = $4,
                instructor_avatar = $5, image = $6, level = $7, price = $8,
                rating = $9, is_active = $10, updated_at = now()
            WHERE id = $11
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.category)
        .bind(&data.instructor)
        .bind(&data.instructor_avatar)
        .bind(&data.image)
        .bind(data.level.as_deref().unwrap_or(&self.level))
        .bind(data.price)
        .bind(data.rating.unwrap_or(self.rating))
        .bind(data.is_active.unwrap_or(self.is_active))
        .bind(self.id)
        .fetch_one(mm.executor())
        .await?;

        Ok(updated)
    }

    /// Soft delete: the row stays for enrollments and history.
    async fn delete(self, mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<()> {
        sqlx::query("UPDATE programs SET is_deleted = TRUE, deleted_at = now() WHERE id = $1")
            .bind(self.id)
            .execute(mm.executor())
            .await?;
        Ok(())
    }

    async fn find_by_id(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        id: Uuid,
    ) -> DatabaseResult<Option<Self>> {
        let result = sqlx::query_as("SELECT * FROM programs WHERE id = $1 AND NOT is_deleted")
            .bind(id)
            .fetch_one(mm.executor())
            .await;
        if let Err(sqlx::Error::RowNotFound) = result {
            return Ok(None);
        }

        Ok(Some(result?))
    }

    async fn list(
        mm: &ModelManager,
        _actor: &AuthenticatedUser,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        Self::search(mm, &ProgramFilter::default(), limit, offset).await
    }

    async fn count(mm: &ModelManager, _actor: &AuthenticatedUser) -> DatabaseResult<i64> {
        Self::count_matching(mm, &ProgramFilter::default()).await
    }
}

impl_paginatable_for!(Program, ProgramCreate, Uuid);

#[async_trait]
impl HasOwner for Program {
    type OwnerId = Uuid;

    async fn get_owner_id(
        &self,
        _mm: &ModelManager,
        _actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId> {
        Ok(self.author_id)
    }
}

const CATALOG_FILTER: &str = r#"
    NOT is_deleted AND is_active
    AND ($1::TEXT IS NULL OR category ILIKE $1 ESCAPE '\')
    AND ($2::TEXT IS NULL OR title ILIKE $2 ESCAPE '\')
"#;

/// `%term%` with LIKE metacharacters in `term` matched literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl ProgramFilter {
    fn patterns(&self) -> (Option<String>, Option<String>) {
        (
            self.category.as_deref().map(contains_pattern),
            self.search.as_deref().map(contains_pattern),
        )
    }
}

impl Program {
    /// Active, not deleted programs matching `filter`, newest first.
    pub async fn search(
        mm: &ModelManager,
        filter: &ProgramFilter,
        limit: i64,
        offset: i64,
    ) -> DatabaseResult<Vec<Self>> {
        let sql = format!(
            "SELECT * FROM programs WHERE {CATALOG_FILTER} ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        );
        let (category, search) = filter.patterns();
        let found = sqlx::query_as(&sql)
            .bind(category)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(mm.executor())
            .await?;
        Ok(found)
    }

    pub async fn count_matching(mm: &ModelManager, filter: &ProgramFilter) -> DatabaseResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM programs WHERE {CATALOG_FILTER}");
        let (category, search) = filter.patterns();
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(category)
            .bind(search)
            .fetch_one(mm.executor())
            .await?;
        Ok(count)
    }

    /// Every active program matching `filter`, without paging.
    pub async fn search_all(mm: &ModelManager, filter: &ProgramFilter) -> DatabaseResult<Vec<Self>> {
        Self::search(mm, filter, i64::MAX, 0).await
    }

    pub async fn categories(mm: &ModelManager) -> DatabaseResult<Vec<String>> {
        let found = sqlx::query_scalar(
            r#"
            SELECT DISTINCT category FROM programs
            WHERE NOT is_deleted AND is_active AND category <> ''
            ORDER BY category
            "#,
        )
        .fetch_all(mm.executor())
        .await?;
        Ok(found)
    }

    pub async fn enrolled_by(mm: &ModelManager, learner_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let found = sqlx::query_as(
            r#"
            SELECT p.* FROM programs p
            JOIN enrollments e ON e.program_id = p.id
            WHERE e.learner_id = $1 AND NOT p.is_deleted
            ORDER BY e.created_at
            "#,
        )
        .bind(learner_id)
        .fetch_all(mm.executor())
        .await?;
        Ok(found)
    }

    pub async fn attach_module(
        &self,
        mm: &ModelManager,
        module_id: Uuid,
        position: i32,
    ) -> DatabaseResult<()> {
        sqlx::query(
            "INSERT INTO program_modules (program_id, module_id, position) VALUES ($1, $2, $3)",
        )
        .bind(self.id)
        .bind(module_id)
        .bind(position)
        .execute(mm.executor())
        .await?;
        Ok(())
    }

    /// Returns `false` when the module was not part of the program.
    pub async fn detach_module(&self, mm: &ModelManager, module_id: Uuid) -> DatabaseResult<bool> {
        let result =
            sqlx::query("DELETE FROM program_modules WHERE program_id = $1 AND module_id = $2")
                .bind(self.id)
                .bind(module_id)
                .execute(mm.executor())
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Module and topic ids in position order, deleted nodes skipped.
    pub async fn tree(mm: &ModelManager, program_id: Uuid) -> DatabaseResult<ProgramTree> {
        let rows: Vec<(Uuid, Option<Uuid>)> = sqlx::query_as(
            r#"
            SELECT pm.module_id, t.id
            FROM program_modules pm
            JOIN modules m ON m.id = pm.module_id AND NOT m.is_deleted
            LEFT JOIN module_topics mt ON mt.module_id = pm.module_id
            LEFT JOIN topics t ON t.id = mt.topic_id AND NOT t.is_deleted
            WHERE pm.program_id = $1
            ORDER BY pm.position, mt.position
            "#,
        )
        .bind(program_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(ProgramTree::from_rows(program_id, rows))
    }
}

// Utils

/// One module of a program with its topics and their resources nested as JSON.
#[derive(Debug, Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct ProgramModuleOutline {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub position: i32,
    /// `[{id, title, description, position, resources: [...]}]`
    #[schema(value_type = Vec<Object>)]
    pub topics: serde_json::Value,
}

impl ProgramModuleOutline {
    pub async fn fetch_all(mm: &ModelManager, program_id: Uuid) -> DatabaseResult<Vec<Self>> {
        let rows: Vec<ProgramModuleOutline> = sqlx::query_as(
            r#"
            SELECT
            m.id,
            m.title,
            m.description,
            pm.position,
            COALESCE((
                SELECT json_agg(
                    json_build_object(
                        'id', t.id,
                        'title', t.title,
                        'description', t.description,
                        'position', mt.position,
                        'resources', COALESCE((
                            SELECT json_agg(
                                json_build_object(
                                    'id', r.id,
                                    'title', r.title,
                                    'description', r.description,
                                    'url', r.url,
                                    'resource_type', r.resource_type,
                                    'position', tr.position
                                ) ORDER BY tr.position
                            )
                            FROM topic_resources tr
                            JOIN resources r ON r.id = tr.resource_id
                            WHERE tr.topic_id = t.id
                        ), '[]'::json)
                    ) ORDER BY mt.position
                )
                FROM module_topics mt
                JOIN topics t ON t.id = mt.topic_id AND NOT t.is_deleted
                WHERE mt.module_id = m.id
            ), '[]'::json) AS topics
            FROM program_modules pm
            JOIN modules m ON m.id = pm.module_id AND NOT m.is_deleted
            WHERE pm.program_id = $1
            ORDER BY pm.position
            "#,
        )
        .bind(program_id)
        .fetch_all(mm.executor())
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn search_terms_match_literally() {
        assert_eq!(contains_pattern("rust"), "%rust%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern("c:\\dev"), "%c:\\\\dev%");
    }

    #[test]
    fn empty_filter_binds_nothing() {
        assert_eq!(ProgramFilter::default().patterns(), (None, None));

        let filter = ProgramFilter {
            category: Some("Art".into()),
            search: None,
        };
        assert_eq!(filter.patterns(), (Some("%Art%".into()), None));
    }
}
