use predicates::prelude::*;
use std::fs;
use test_env::*;

const CSV: &str = "Lead Name,Email Address,Phone Number,Preferred Country\n\
\"Doe, Jane\",jane@example.com,+1 555 0100,Canada\n\
,nobody@example.com,,\n\
\n\
\"Raj \"\"RJ\"\" Patel\",raj@example.com,+1 555 0101,UK\n";

#[test]
fn test_import_dry_run_writes_nothing() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);
    login_admin(&temp_dir);
    let file = temp_dir.path().join("leads.csv");
    fs::write(&file, CSV).unwrap();

    abroad_cmd(&temp_dir)
        .args(["leads", "import", file.to_str().unwrap(), "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Lead Name"))
        .stdout(predicate::str::contains("Doe, Jane"))
        .stdout(predicate::str::contains("2 lead(s) ready to import, 1 row(s) skipped"))
        .stdout(predicate::str::contains("Dry run"));

    let leads = json_output(&temp_dir, &["leads", "list", "--json"]);
    assert_eq!(leads.as_array().unwrap().len(), 6);
}

#[test]
fn test_import_creates_leads_at_first_stage() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);
    login_admin(&temp_dir);
    let file = temp_dir.path().join("leads.csv");
    fs::write(&file, CSV).unwrap();

    abroad_cmd(&temp_dir)
        .args(["leads", "import", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 lead(s)."));

    let leads = json_output(&temp_dir, &["leads", "list", "patel", "--json"]);
    let raj = &leads.as_array().unwrap()[0];
    assert_eq!(raj["name"], "Raj \"RJ\" Patel");
    assert_eq!(raj["stage"], "Yet to Assign");
    assert_eq!(raj["source"], "CSV Import");

    let id = raj["id"].as_i64().unwrap().to_string();
    let ws = json_output(&temp_dir, &["lead", "show", &id, "--json"]);
    assert_eq!(ws["history"][0]["origin"], "import");
}

#[test]
fn test_import_column_override_and_errors() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);
    login_admin(&temp_dir);

    let file = temp_dir.path().join("custom.csv");
    fs::write(&file, "Student,Mail\nLi Wei,li@example.com\n").unwrap();

    abroad_cmd(&temp_dir)
        .args(["leads", "import", file.to_str().unwrap(), "--dry-run"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Import failed"));

    abroad_cmd(&temp_dir)
        .args([
            "leads", "import", file.to_str().unwrap(),
            "--map", "Student=name", "--map", "Mail=email",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 lead(s)."));

    abroad_cmd(&temp_dir)
        .args(["leads", "import", temp_dir.path().join("missing.csv").to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("file not found"));
}

#[test]
fn test_import_non_utf8_file_is_user_error() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);
    login_admin(&temp_dir);

    let file = temp_dir.path().join("latin1.csv");
    fs::write(&file, b"name,email\nJos\xe9 Ruiz,jose@example.com\n").unwrap();

    abroad_cmd(&temp_dir)
        .args(["leads", "import", file.to_str().unwrap(), "--dry-run"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not UTF-8"));

    abroad_cmd(&temp_dir)
        .args(["leads", "import", temp_dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("is a directory"));
}
