use predicates::prelude::*;
use test_env::*;

#[test]
fn test_admin_adds_and_lists_leads() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);
    login_admin(&temp_dir);

    abroad_cmd(&temp_dir)
        .args(["leads", "add", "Priya", "Nair", "email=priya@example.com", "phone=+91 98765", "country=Germany"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created lead 7: Priya Nair"));

    let leads = json_output(&temp_dir, &["leads", "list", "--json"]);
    assert_eq!(leads.as_array().unwrap().len(), 7);

    let ws = json_output(&temp_dir, &["lead", "show", "7", "--json"]);
    assert_eq!(ws["lead"]["stage"], "Yet to Assign");
    assert_eq!(ws["lead"]["country"], "Germany");
    assert_eq!(ws["history"].as_array().unwrap().len(), 1);

    abroad_cmd(&temp_dir)
        .args(["leads", "add", "Bob", "emial=bob@example.com"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Did you mean 'email'?"));
}

#[test]
fn test_search_and_stage_filter() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);
    login_admin(&temp_dir);

    let leads = json_output(&temp_dir, &["leads", "list", "johnson", "--json"]);
    let names: Vec<&str> = leads.as_array().unwrap().iter().map(|l| l["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Alice Johnson", "Emily Johnson"]);

    let leads = json_output(&temp_dir, &["leads", "list", "234 567", "--json"]);
    assert_eq!(leads.as_array().unwrap().len(), 1);

    let leads = json_output(&temp_dir, &["leads", "list", "stage=yet to assign", "--json"]);
    assert_eq!(leads.as_array().unwrap().len(), 3);

    abroad_cmd(&temp_dir)
        .args(["leads", "list", "stage=Yet to Asign"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Did you mean 'Yet to Assign'?"));
}

#[test]
fn test_counselor_sees_only_own_leads() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);
    login_counselor(&temp_dir);

    let leads = json_output(&temp_dir, &["leads", "list", "--json"]);
    let names: Vec<&str> = leads.as_array().unwrap().iter().map(|l| l["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Alice Johnson", "Michael Brown"]);
}

#[test]
fn test_bulk_assign() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);
    login_admin(&temp_dir);

    abroad_cmd(&temp_dir)
        .args(["leads", "assign", "2,4,99", "Sarah", "Miller"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Assigned 2 lead(s) to Sarah Miller."))
        .stdout(predicate::str::contains("1 lead(s) moved to \"Yet to Contact\"."))
        .stdout(predicate::str::contains("Skipped unknown lead(s): 99"));

    // Unassigned lead moves forward; lead 4 keeps "Docs Submitted"
    assert_eq!(stage_of(&temp_dir, "2"), "Yet to Contact");
    assert_eq!(stage_of(&temp_dir, "4"), "Docs Submitted");

    let ws = json_output(&temp_dir, &["lead", "show", "2", "--json"]);
    let last = ws["history"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["origin"], "assignment");
    assert_eq!(last["actor"], "Sarah Miller");
    assert_eq!(ws["manager"]["name"], "John Doe");

    abroad_cmd(&temp_dir)
        .args(["leads", "assign", "3", "nobody@buildabroad.com"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_bulk_assign_rejects_huge_range() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);
    login_admin(&temp_dir);

    abroad_cmd(&temp_dir)
        .args(["leads", "assign", "1-9223372036854775807", "Sarah", "Miller"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("too large"));

    assert_eq!(stage_of(&temp_dir, "2"), "Yet to Assign");
}

#[test]
fn test_command_abbreviations() {
    let (temp_dir, _guard) = setup_test_env();
    seed(&temp_dir);
    login_admin(&temp_dir);

    abroad_cmd(&temp_dir)
        .args(["dash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Admin Dashboard"));

    abroad_cmd(&temp_dir)
        .args(["lo"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Ambiguous command 'lo'"));

    abroad_cmd(&temp_dir)
        .args(["1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Lead 1: Alice Johnson"));
}

#[test]
fn test_stages_list() {
    let (temp_dir, _guard) = setup_test_env();

    let stages = json_output(&temp_dir, &["stages", "--json"]);
    let stages = stages.as_array().unwrap();
    assert_eq!(stages.len(), 18);
    assert_eq!(stages[0]["label"], "Yet to Assign");
    assert_eq!(stages[17]["label"], "Commission Received");
    assert_eq!(stages[11]["converted"], true);
    assert_eq!(stages[10]["converted"], false);
}
