use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Module, Resource};

const MODULE_COLUMNS: &str = "id, course_id, title, description, position, created_at, updated_at";
const RESOURCE_COLUMNS: &str =
    "id, module_id, title, description, mimetype, source, position, created_at, updated_at";

pub(crate) struct CreateModule<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) struct CreateResource<'a> {
    pub(crate) id: &'a str,
    pub(crate) module_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) description: &'a str,
    pub(crate) mimetype: &'a str,
    pub(crate) source: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn list_modules(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<Module>, sqlx::Error> {
    sqlx::query_as::<_, Module>(&format!(
        "SELECT {MODULE_COLUMNS} FROM modules WHERE course_id = $1 ORDER BY position"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_module(
    pool: &PgPool,
    course_id: &str,
    module_id: &str,
) -> Result<Option<Module>, sqlx::Error> {
    sqlx::query_as::<_, Module>(&format!(
        "SELECT {MODULE_COLUMNS} FROM modules WHERE id = $1 AND course_id = $2"
    ))
    .bind(module_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

/// New modules always land at the end of the course. Counting and
/// inserting share a transaction so concurrent creates cannot collide
/// on a position.
pub(crate) async fn create_module(
    pool: &PgPool,
    params: CreateModule<'_>,
) -> Result<Module, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM modules WHERE course_id = $1")
        .bind(params.course_id)
        .fetch_one(&mut *tx)
        .await?;

    let module = sqlx::query_as::<_, Module>(&format!(
        "INSERT INTO modules (id, course_id, title, description, position, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$6)
         RETURNING {MODULE_COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.description)
    .bind(count as i32 + 1)
    .bind(params.created_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(module)
}

pub(crate) async fn update_module_fields(
    pool: &PgPool,
    module_id: &str,
    title: Option<&str>,
    description: Option<&str>,
    updated_at: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE modules SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            updated_at = $3
         WHERE id = $4",
    )
    .bind(title)
    .bind(description)
    .bind(updated_at)
    .bind(module_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Moving a module exchanges its slot with the current occupant of the
/// target position. Returns false when the target is out of range.
pub(crate) async fn swap_module_position(
    pool: &PgPool,
    course_id: &str,
    module_id: &str,
    target_position: i32,
    updated_at: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_scalar::<_, i32>(
        "SELECT position FROM modules WHERE id = $1 AND course_id = $2 FOR UPDATE",
    )
    .bind(module_id)
    .bind(course_id)
    .fetch_one(&mut *tx)
    .await?;

    if current == target_position {
        tx.commit().await?;
        return Ok(true);
    }

    let occupant = sqlx::query_scalar::<_, String>(
        "SELECT id FROM modules WHERE course_id = $1 AND position = $2 FOR UPDATE",
    )
    .bind(course_id)
    .bind(target_position)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(occupant_id) = occupant else {
        tx.rollback().await?;
        return Ok(false);
    };

    sqlx::query("UPDATE modules SET position = $1, updated_at = $2 WHERE id = $3")
        .bind(current)
        .bind(updated_at)
        .bind(&occupant_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE modules SET position = $1, updated_at = $2 WHERE id = $3")
        .bind(target_position)
        .bind(updated_at)
        .bind(module_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

/// Deletes the module and closes the gap it leaves, keeping positions
/// 1-based and contiguous.
pub(crate) async fn delete_module(
    pool: &PgPool,
    course_id: &str,
    module_id: &str,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let position = sqlx::query_scalar::<_, i32>(
        "SELECT position FROM modules WHERE id = $1 AND course_id = $2 FOR UPDATE",
    )
    .bind(module_id)
    .bind(course_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(position) = position else {
        tx.rollback().await?;
        return Ok(false);
    };

    sqlx::query("DELETE FROM modules WHERE id = $1").bind(module_id).execute(&mut *tx).await?;

    sqlx::query("UPDATE modules SET position = position - 1 WHERE course_id = $1 AND position > $2")
        .bind(course_id)
        .bind(position)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

pub(crate) async fn list_resources(
    pool: &PgPool,
    module_id: &str,
) -> Result<Vec<Resource>, sqlx::Error> {
    sqlx::query_as::<_, Resource>(&format!(
        "SELECT {RESOURCE_COLUMNS} FROM resources WHERE module_id = $1 ORDER BY position"
    ))
    .bind(module_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_resource(
    pool: &PgPool,
    module_id: &str,
    resource_id: &str,
) -> Result<Option<Resource>, sqlx::Error> {
    sqlx::query_as::<_, Resource>(&format!(
        "SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1 AND module_id = $2"
    ))
    .bind(resource_id)
    .bind(module_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn create_resource(
    pool: &PgPool,
    params: CreateResource<'_>,
) -> Result<Resource, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM resources WHERE module_id = $1")
            .bind(params.module_id)
            .fetch_one(&mut *tx)
            .await?;

    let resource = sqlx::query_as::<_, Resource>(&format!(
        "INSERT INTO resources (
            id, module_id, title, description, mimetype, source, position, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
         RETURNING {RESOURCE_COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.module_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.mimetype)
    .bind(params.source)
    .bind(count as i32 + 1)
    .bind(params.created_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(resource)
}

pub(crate) async fn update_resource_fields(
    pool: &PgPool,
    resource_id: &str,
    title: Option<&str>,
    description: Option<&str>,
    mimetype: Option<&str>,
    source: Option<&str>,
    updated_at: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE resources SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            mimetype = COALESCE($3, mimetype),
            source = COALESCE($4, source),
            updated_at = $5
         WHERE id = $6",
    )
    .bind(title)
    .bind(description)
    .bind(mimetype)
    .bind(source)
    .bind(updated_at)
    .bind(resource_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn swap_resource_position(
    pool: &PgPool,
    module_id: &str,
    resource_id: &str,
    target_position: i32,
    updated_at: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_scalar::<_, i32>(
        "SELECT position FROM resources WHERE id = $1 AND module_id = $2 FOR UPDATE",
    )
    .bind(resource_id)
    .bind(module_id)
    .fetch_one(&mut *tx)
    .await?;

    if current == target_position {
        tx.commit().await?;
        return Ok(true);
    }

    let occupant = sqlx::query_scalar::<_, String>(
        "SELECT id FROM resources WHERE module_id = $1 AND position = $2 FOR UPDATE",
    )
    .bind(module_id)
    .bind(target_position)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(occupant_id) = occupant else {
        tx.rollback().await?;
        return Ok(false);
    };

    sqlx::query("UPDATE resources SET position = $1, updated_at = $2 WHERE id = $3")
        .bind(current)
        .bind(updated_at)
        .bind(&occupant_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE resources SET position = $1, updated_at = $2 WHERE id = $3")
        .bind(target_position)
        .bind(updated_at)
        .bind(resource_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

pub(crate) async fn delete_resource(
    pool: &PgPool,
    module_id: &str,
    resource_id: &str,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let position = sqlx::query_scalar::<_, i32>(
        "SELECT position FROM resources WHERE id = $1 AND module_id = $2 FOR UPDATE",
    )
    .bind(resource_id)
    .bind(module_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(position) = position else {
        tx.rollback().await?;
        return Ok(false);
    };

    sqlx::query("DELETE FROM resources WHERE id = $1").bind(resource_id).execute(&mut *tx).await?;

    sqlx::query(
        "UPDATE resources SET position = position - 1 WHERE module_id = $1 AND position > $2",
    )
    .bind(module_id)
    .bind(position)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(true)
}
