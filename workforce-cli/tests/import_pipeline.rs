//! End-to-end import scenarios through the library API

use rust_xlsxwriter::Workbook;
use sqlx::SqlitePool;

use workforce_cli::import::excel::export_records;
use workforce_cli::import::types::{
    CanonicalRecord, ConflictKind, ConflictPolicy, DateField, FieldKey, Resolution,
    ResolutionAction,
};
use workforce_cli::import::{
    BatchResult, ImportError, ImportOptions, SubmitOutcome, parse_workbook, prepare_batch,
    submit_batch, submit_workbook,
};
use workforce_cli::store::{connect_in_memory, employees};

/// Build a single-sheet workbook; empty strings leave the cell blank
fn workbook(headers: &[FieldKey], rows: &[Vec<&str>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, key) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, key.label()).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet
                    .write_string(r as u32 + 1, col as u16, *value)
                    .unwrap();
            }
        }
    }

    workbook.save_to_buffer().unwrap()
}

const BASIC: [FieldKey; 5] = [
    FieldKey::EmployeeId,
    FieldKey::Name,
    FieldKey::Email,
    FieldKey::Department,
    FieldKey::Designation,
];

fn person(row: usize, id: &str, name: &str, email: &str) -> CanonicalRecord {
    CanonicalRecord {
        row_number: row,
        external_id: id.into(),
        name: name.into(),
        email: Some(email.into()),
        department: "Engineering".into(),
        designation: "Engineer".into(),
        ..Default::default()
    }
}

async fn import(pool: &SqlitePool, bytes: &[u8], policy: ConflictPolicy) -> BatchResult {
    match submit_workbook(pool, bytes, policy, &ImportOptions::default())
        .await
        .unwrap()
    {
        SubmitOutcome::Completed(result) => result,
        SubmitOutcome::NeedsResolution(batch) => {
            panic!("unexpected pending conflicts: {:?}", batch.pending_ids())
        }
    }
}

#[tokio::test]
async fn reimporting_the_same_sheet_changes_nothing() {
    let pool = connect_in_memory().await.unwrap();
    let headers = [
        FieldKey::EmployeeId,
        FieldKey::Name,
        FieldKey::Email,
        FieldKey::Department,
        FieldKey::Designation,
        FieldKey::Skills,
        FieldKey::ProjectName,
        FieldKey::Client,
        FieldKey::ProjectAllocation,
        FieldKey::ProjectEndDate,
    ];
    let bytes = workbook(
        &headers,
        &[
            vec![
                "EMP001", "Asha Rao", "asha@example.com", "Engineering", "Engineer",
                "Rust; SQL", "Apollo; Hermes", "Acme; Globex", "60; 40", "31-12-2025; SOW",
            ],
            vec![
                "EMP002", "Ravi Kumar", "ravi@example.com", "Delivery", "Tech Lead",
                "", "", "Initech", "100", "",
            ],
        ],
    );

    let first = import(&pool, &bytes, ConflictPolicy::Skip).await;
    assert_eq!(first.created, 2);
    assert!(!first.has_errors());
    let before = employees::find_by_external_id(&pool, "EMP001").await.unwrap().unwrap();
    assert_eq!(before.record.projects.len(), 2);

    let second = import(&pool, &bytes, ConflictPolicy::Skip).await;
    assert_eq!((second.created, second.updated, second.skipped), (0, 0, 2));
    assert_eq!(second.details.skipped["EMP001"], "no differences");
    assert_eq!(second.details.skipped["EMP002"], "no differences");

    let after = employees::find_by_external_id(&pool, "EMP001").await.unwrap().unwrap();
    assert_eq!(after.updated_at, before.updated_at);
    assert_eq!(after.record, before.record);
    assert_eq!(employees::count(&pool).await.unwrap(), 2);
}

#[tokio::test]
async fn sentinels_survive_export_and_reimport() {
    let pool = connect_in_memory().await.unwrap();
    let headers = [
        FieldKey::EmployeeId,
        FieldKey::Name,
        FieldKey::Email,
        FieldKey::Department,
        FieldKey::Designation,
        FieldKey::PoEndDate,
        FieldKey::Client,
        FieldKey::ProjectEndDate,
    ];
    let bytes = workbook(
        &headers,
        &[vec![
            "EMP010", "Meera Iyer", "meera@example.com", "Quality", "Engineer", "sow", "Acme",
            "Milestone",
        ]],
    );
    import(&pool, &bytes, ConflictPolicy::Skip).await;

    let stored = employees::find_by_external_id(&pool, "EMP010").await.unwrap().unwrap();
    assert_eq!(stored.record.po_end_date.to_string(), "sow");
    assert_eq!(stored.record.projects[0].end_date.to_string(), "Milestone");

    let exported = export_records(&[stored.record.clone()]).unwrap();
    let (_, records) = parse_workbook(&exported).unwrap();
    assert_eq!(records[0].po_end_date, stored.record.po_end_date);
    assert_eq!(records[0].projects, stored.record.projects);

    // Exported sheet is a valid import with nothing to change
    let result = import(&pool, &exported, ConflictPolicy::Overwrite).await;
    assert_eq!((result.updated, result.skipped), (0, 1));
}

const PLACEHOLDER_HEADERS: [FieldKey; 10] = [
    FieldKey::EmployeeId,
    FieldKey::Name,
    FieldKey::Email,
    FieldKey::Department,
    FieldKey::Designation,
    FieldKey::PoEndDate,
    FieldKey::ProjectName,
    FieldKey::Client,
    FieldKey::ProjectAllocation,
    FieldKey::ProjectEndDate,
];

fn placeholder_sheet(email: &str, po_end: &str, project_name: &str, project_end: &str) -> Vec<u8> {
    workbook(
        &PLACEHOLDER_HEADERS,
        &[vec![
            "EMP020", "Kiran Shah", email, "Engineering", "Engineer", po_end, project_name,
            "Acme", "100", project_end,
        ]],
    )
}

#[tokio::test]
async fn placeholder_project_and_open_dates_are_not_conflicts() {
    let pool = connect_in_memory().await.unwrap();
    let stored_sheet = placeholder_sheet("kiran@example.com", "", "", "");
    assert_eq!(import(&pool, &stored_sheet, ConflictPolicy::Skip).await.created, 1);

    let bytes = placeholder_sheet("KIRAN@example.com", "NA", "Acme - Default Project", "SOW");

    // `ask` completes straight away: the only match has nothing to decide
    let result = import(&pool, &bytes, ConflictPolicy::Ask).await;
    assert_eq!(result.skipped, 1);
    assert_eq!(result.details.skipped["EMP020"], "no differences");

    let stored = employees::find_by_external_id(&pool, "EMP020").await.unwrap().unwrap();
    assert_eq!(stored.record.po_end_date, DateField::Empty);
}

#[tokio::test]
async fn blank_project_name_matches_stored_default_project() {
    let pool = connect_in_memory().await.unwrap();
    let stored_sheet = placeholder_sheet("kiran@example.com", "", "Acme - Default Project", "");
    assert_eq!(import(&pool, &stored_sheet, ConflictPolicy::Skip).await.created, 1);

    let bytes = placeholder_sheet("kiran@example.com", "", "", "");
    let result = import(&pool, &bytes, ConflictPolicy::Ask).await;
    assert_eq!((result.updated, result.skipped), (0, 1));
    assert_eq!(result.details.skipped["EMP020"], "no differences");

    let stored = employees::find_by_external_id(&pool, "EMP020").await.unwrap().unwrap();
    assert_eq!(stored.record.projects[0].project_name, "Acme - Default Project");

    // A real project name under the same client is still a change
    let renamed = placeholder_sheet("kiran@example.com", "", "Atlas", "");
    let outcome = submit_workbook(&pool, &renamed, ConflictPolicy::Ask, &ImportOptions::default())
        .await
        .unwrap();
    let SubmitOutcome::NeedsResolution(batch) = outcome else {
        panic!("expected a pending conflict");
    };
    assert_eq!(batch.conflicts()[0].differences[0].field, "projectName");
}

#[tokio::test]
async fn over_allocated_batch_is_rejected_whole() {
    let pool = connect_in_memory().await.unwrap();
    let headers = [
        FieldKey::EmployeeId,
        FieldKey::Name,
        FieldKey::Email,
        FieldKey::Department,
        FieldKey::Designation,
        FieldKey::ProjectName,
        FieldKey::Client,
        FieldKey::ProjectAllocation,
    ];
    let bytes = workbook(
        &headers,
        &[
            vec!["EMP030", "Fine", "fine@example.com", "Design", "Engineer", "Apollo", "Acme", "100"],
            vec![
                "EMP031", "Busy", "busy@example.com", "Design", "Engineer", "Apollo; Hermes",
                "Acme; Globex", "60; 50",
            ],
        ],
    );

    let err = submit_workbook(&pool, &bytes, ConflictPolicy::Overwrite, &ImportOptions::default())
        .await
        .unwrap_err();
    match err {
        ImportError::Validation(v) => {
            assert_eq!(v.violations.len(), 1);
            assert_eq!(v.violations[0].row_number, 3);
            assert_eq!(v.violations[0].field, "projectAllocation");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(employees::count(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn duplicate_id_in_sheet_reports_later_row_only() {
    let pool = connect_in_memory().await.unwrap();
    let bytes = workbook(
        &BASIC,
        &[
            vec!["EMP040", "First", "first@example.com", "Sales", "Engineer"],
            vec!["emp040", "Second", "second@example.com", "Sales", "Engineer"],
        ],
    );

    let err = submit_workbook(&pool, &bytes, ConflictPolicy::Skip, &ImportOptions::default())
        .await
        .unwrap_err();
    let ImportError::Validation(v) = err else {
        panic!("expected validation failure");
    };
    assert_eq!(v.violations.len(), 1);
    assert_eq!(v.violations[0].row_number, 3);
    assert_eq!(v.violations[0].field, "employeeId");
    assert!(v.violations[0].message.contains("row 2"));
    assert_eq!(employees::count(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn one_failed_write_leaves_the_rest_applied() {
    let pool = connect_in_memory().await.unwrap();
    let options = ImportOptions::default();
    let records = vec![
        person(2, "EMP050", "A", "a@example.com"),
        person(3, "EMP051", "B", "b@example.com"),
        person(4, "EMP052", "C", "c@example.com"),
    ];

    let batch = prepare_batch(&pool, Vec::new(), records, &options).await.unwrap();
    assert!(batch.is_ready());

    // Another writer takes row 3's email between detection and apply
    employees::insert(&pool, &person(0, "OTHER", "Other", "B@example.com"), "someone")
        .await
        .unwrap();

    let result = batch.apply(&pool, &options.apply).await.unwrap();
    assert_eq!(result.created, 2);
    assert_eq!(result.failed(), 1);
    assert_eq!(result.errors[0].row_number, 3);
    assert_eq!(result.errors[0].external_id, "EMP051");
    assert_eq!(result.errors[0].field, "email");
    assert_eq!(employees::count(&pool).await.unwrap(), 3);
}

#[tokio::test]
async fn use_incoming_replaces_the_stored_record() {
    let pool = connect_in_memory().await.unwrap();
    let options = ImportOptions::default();
    submit_batch(
        &pool,
        vec![person(0, "EMP060", "Asha", "asha@example.com")],
        ConflictPolicy::Skip,
        &options,
    )
    .await
    .unwrap();
    let original = employees::find_by_external_id(&pool, "EMP060").await.unwrap().unwrap();

    let bytes = workbook(
        &BASIC,
        &[vec!["EMP060", "Asha Rao", "asha@example.com", "Delivery", "Engineer"]],
    );
    let outcome = submit_workbook(&pool, &bytes, ConflictPolicy::Ask, &options)
        .await
        .unwrap();
    let SubmitOutcome::NeedsResolution(mut batch) = outcome else {
        panic!("expected a pending conflict");
    };

    let conflict = &batch.conflicts()[0];
    assert_eq!(conflict.kind, ConflictKind::IdOnly);
    let fields: Vec<&str> = conflict.differences.iter().map(|d| d.field.as_str()).collect();
    assert_eq!(fields, vec!["name", "department"]);
    assert_eq!(batch.raw_rows().len(), 1);

    batch
        .resolve(&[Resolution::PerConflict {
            conflict_id: 0,
            action: ResolutionAction::UseIncoming,
        }])
        .unwrap();
    let result = batch.apply(&pool, &options.apply).await.unwrap();
    assert_eq!(result.updated, 1);
    assert_eq!(result.details.updated["EMP060"], original.id);

    let stored = employees::get(&pool, original.id).await.unwrap().unwrap();
    assert_eq!(stored.record.name, "Asha Rao");
    assert_eq!(stored.record.department, "Delivery");
    assert_eq!(stored.created_at, original.created_at);
}

#[tokio::test]
async fn id_and_email_on_different_records_fails_on_overwrite() {
    let pool = connect_in_memory().await.unwrap();
    let options = ImportOptions::default();
    submit_batch(
        &pool,
        vec![
            person(0, "EMP070", "Dev", "dev@example.com"),
            person(0, "EMP071", "Nia", "nia@example.com"),
        ],
        ConflictPolicy::Skip,
        &options,
    )
    .await
    .unwrap();
    let owner = employees::find_by_external_id(&pool, "EMP071").await.unwrap().unwrap();

    let outcome = submit_batch(
        &pool,
        vec![person(2, "EMP070", "Dev", "nia@example.com")],
        ConflictPolicy::Ask,
        &options,
    )
    .await
    .unwrap();
    let SubmitOutcome::NeedsResolution(mut batch) = outcome else {
        panic!("expected a pending conflict");
    };
    assert_eq!(batch.conflicts()[0].kind, ConflictKind::IdAndEmailDistinct);
    assert_eq!(batch.conflicts()[0].email_owner, Some(owner.id));

    batch.apply_policy(ConflictPolicy::Overwrite);
    let result = batch.apply(&pool, &options.apply).await.unwrap();
    assert_eq!(result.updated, 0);
    assert_eq!(result.failed(), 1);
    assert_eq!(result.errors[0].field, "email");
}

#[tokio::test]
async fn two_rows_aimed_at_one_employee_fail_the_later_row() {
    let pool = connect_in_memory().await.unwrap();
    let seed = workbook(&BASIC, &[vec!["E1", "Asha", "a@x.io", "Engineering", "Engineer"]]);
    assert_eq!(import(&pool, &seed, ConflictPolicy::Skip).await.created, 1);
    let original = employees::find_by_external_id(&pool, "E1").await.unwrap().unwrap();

    // Row 2 hits E1 by id, row 3 hits it again through the old address
    let bytes = workbook(
        &BASIC,
        &[
            vec!["E1", "Asha", "b@x.io", "Engineering", "Engineer"],
            vec!["E9", "Asha R", "a@x.io", "Engineering", "Engineer"],
        ],
    );
    let result = import(&pool, &bytes, ConflictPolicy::Overwrite).await;

    assert_eq!((result.created, result.updated), (0, 1));
    assert_eq!(result.failed(), 1);
    assert_eq!(result.errors[0].row_number, 3);
    assert_eq!(result.errors[0].external_id, "E9");
    assert_eq!(result.errors[0].field, "email");
    assert_eq!(result.details.updated["E1"], original.id);

    let stored = employees::get(&pool, original.id).await.unwrap().unwrap();
    assert_eq!(stored.record.external_id, "E1");
    assert_eq!(stored.record.email.as_deref(), Some("b@x.io"));
    assert!(employees::find_by_external_id(&pool, "E9").await.unwrap().is_none());
    assert_eq!(employees::count(&pool).await.unwrap(), 1);
}
