//! Employee repository

use anyhow::{Context, Result};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::import::types::{CanonicalRecord, DateField, FieldKey, ProjectAssignment, StoredEmployee};

/// Ids per DELETE statement, below SQLite's bound-parameter limit
const DELETE_CHUNK: usize = 500;

const SELECT_COLUMNS: &str = "id, external_id, name, email, phone, department, designation,
    location, skills, management_mode, billability_status, experience_band,
    billability_percentage, rate, ctc, ageing_days, bench_days, joining_date,
    separation_date, po_start_date, po_end_date, projects, source_row,
    created_at, created_by, updated_at, updated_by";

/// Read every stored employee, ordered by external id
pub async fn snapshot(pool: &SqlitePool) -> Result<Vec<StoredEmployee>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM employees ORDER BY external_id",
        SELECT_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .context("Failed to read employees")?;

    rows.iter().map(row_to_employee).collect()
}

/// Get an employee by internal id
pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<StoredEmployee>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM employees WHERE id = ?",
        SELECT_COLUMNS
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to get employee {}", id))?;

    row.as_ref().map(row_to_employee).transpose()
}

/// Find an employee by external id (case-insensitive)
pub async fn find_by_external_id(
    pool: &SqlitePool,
    external_id: &str,
) -> Result<Option<StoredEmployee>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM employees WHERE external_id = ?",
        SELECT_COLUMNS
    ))
    .bind(external_id.trim())
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to find employee '{}'", external_id))?;

    row.as_ref().map(row_to_employee).transpose()
}

/// Number of stored employees
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
        .fetch_one(pool)
        .await
        .context("Failed to count employees")?;
    Ok(count)
}

/// Insert a new employee and return its internal id
pub async fn insert(pool: &SqlitePool, record: &CanonicalRecord, actor: &str) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = chrono::Utc::now().to_rfc3339();

    let query = sqlx::query(
        "INSERT INTO employees (id, external_id, name, email, phone, department, designation,
            location, skills, management_mode, billability_status, experience_band,
            billability_percentage, rate, ctc, ageing_days, bench_days, joining_date,
            separation_date, po_start_date, po_end_date, projects, source_row,
            created_at, created_by, updated_at, updated_by)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id.to_string());

    bind_record(query, record)?
        .bind(now.clone())
        .bind(actor.to_string())
        .bind(now)
        .bind(actor.to_string())
        .execute(pool)
        .await
        .with_context(|| format!("Failed to insert employee '{}'", record.external_id))?;

    Ok(id)
}

/// Replace every field of an existing employee and refresh its audit columns.
///
/// Returns `false` when no employee has this id.
pub async fn overwrite(
    pool: &SqlitePool,
    id: Uuid,
    record: &CanonicalRecord,
    actor: &str,
) -> Result<bool> {
    let now = chrono::Utc::now().to_rfc3339();

    let query = sqlx::query(
        "UPDATE employees SET external_id = ?, name = ?, email = ?, phone = ?, department = ?,
            designation = ?, location = ?, skills = ?, management_mode = ?,
            billability_status = ?, experience_band = ?, billability_percentage = ?, rate = ?,
            ctc = ?, ageing_days = ?, bench_days = ?, joining_date = ?, separation_date = ?,
            po_start_date = ?, po_end_date = ?, projects = ?, source_row = ?,
            updated_at = ?, updated_by = ?
         WHERE id = ?",
    );

    let result = bind_record(query, record)?
        .bind(now)
        .bind(actor.to_string())
        .bind(id.to_string())
        .execute(pool)
        .await
        .with_context(|| format!("Failed to overwrite employee '{}'", record.external_id))?;

    Ok(result.rows_affected() > 0)
}

/// Delete employees by internal id in one transaction, returning how many existed
pub async fn delete_many(pool: &SqlitePool, ids: &[Uuid]) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let mut deleted = 0;

    for chunk in ids.chunks(DELETE_CHUNK) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!("DELETE FROM employees WHERE id IN ({})", placeholders);
        let mut query = sqlx::query(&sql);
        for id in chunk {
            query = query.bind(id.to_string());
        }
        let result = query
            .execute(&mut *tx)
            .await
            .context("Failed to delete employees")?;
        deleted += result.rows_affected();
    }

    tx.commit().await.context("Failed to commit delete")?;
    log::info!("Deleted {} of {} requested employee(s)", deleted, ids.len());
    Ok(deleted)
}

/// Which unique column a failed write collided on, as a record field name.
///
/// Returns `None` when the error is not a unique-constraint violation.
pub fn unique_violation_field(err: &anyhow::Error) -> Option<String> {
    let db_err = match err.downcast_ref::<sqlx::Error>()? {
        sqlx::Error::Database(db_err) => db_err,
        _ => return None,
    };
    if !db_err.is_unique_violation() {
        return None;
    }

    // "UNIQUE constraint failed: employees.email"
    let message = db_err.message();
    let column = message.rsplit('.').next().unwrap_or_default().trim();
    let field = match column {
        "external_id" => FieldKey::EmployeeId.name(),
        "email" => FieldKey::Email.name(),
        "id" => "id",
        _ => "record",
    };
    Some(field.to_string())
}

fn bind_record<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    record: &CanonicalRecord,
) -> Result<Query<'q, Sqlite, SqliteArguments<'q>>> {
    let projects =
        serde_json::to_string(&record.projects).context("Failed to serialize projects")?;
    let email = record
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(String::from);

    Ok(query
        .bind(record.external_id.trim().to_string())
        .bind(record.name.clone())
        .bind(email)
        .bind(record.phone.clone())
        .bind(record.department.clone())
        .bind(record.designation.clone())
        .bind(record.location.clone())
        .bind(record.skills.join("; "))
        .bind(record.management_mode.clone())
        .bind(record.billability_status.clone())
        .bind(record.experience_band.clone())
        .bind(record.billability_percentage)
        .bind(record.rate)
        .bind(record.ctc)
        .bind(i64::from(record.ageing_days))
        .bind(i64::from(record.bench_days))
        .bind(record.joining_date.to_string())
        .bind(record.separation_date.to_string())
        .bind(record.po_start_date.to_string())
        .bind(record.po_end_date.to_string())
        .bind(projects)
        .bind(record.row_number as i64))
}

fn day_count(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

fn row_to_employee(row: &SqliteRow) -> Result<StoredEmployee> {
    let id: String = row.try_get("id")?;
    let id = Uuid::parse_str(&id).with_context(|| format!("Invalid employee id '{}'", id))?;

    let skills: String = row.try_get("skills")?;
    let projects: String = row.try_get("projects")?;
    let projects: Vec<ProjectAssignment> = serde_json::from_str(&projects)
        .with_context(|| format!("Invalid projects JSON for employee {}", id))?;
    let source_row: i64 = row.try_get("source_row")?;

    let record = CanonicalRecord {
        row_number: usize::try_from(source_row).unwrap_or_default(),
        external_id: row.try_get("external_id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        department: row.try_get("department")?,
        designation: row.try_get("designation")?,
        location: row.try_get("location")?,
        skills: skills
            .split(';')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        management_mode: row.try_get("management_mode")?,
        billability_status: row.try_get("billability_status")?,
        experience_band: row.try_get("experience_band")?,
        billability_percentage: row.try_get("billability_percentage")?,
        rate: row.try_get("rate")?,
        ctc: row.try_get("ctc")?,
        ageing_days: day_count(row.try_get("ageing_days")?),
        bench_days: day_count(row.try_get("bench_days")?),
        joining_date: DateField::from(row.try_get::<String, _>("joining_date")?),
        separation_date: DateField::from(row.try_get::<String, _>("separation_date")?),
        po_start_date: DateField::from(row.try_get::<String, _>("po_start_date")?),
        po_end_date: DateField::from(row.try_get::<String, _>("po_end_date")?),
        projects,
    };

    Ok(StoredEmployee {
        id,
        record,
        created_at: row.try_get("created_at")?,
        created_by: row.try_get("created_by")?,
        updated_at: row.try_get("updated_at")?,
        updated_by: row.try_get("updated_by")?,
    })
}
