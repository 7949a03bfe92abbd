//! CLI integration tests for lend
//!
//! These tests drive the `lend` binary through whole reservation workflows,
//! from project initialization to lending and returning tasks.

use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const ADMIN: &str = "admin@example.com";
const MEMBER: &str = "member@example.com";

/// Get a command instance for the lend binary
///
/// The global config directory points into a throwaway location and any
/// inherited `LEND_USER` is cleared so each test starts anonymous.
fn lend_cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("lend"));
    cmd.env_remove("LEND_USER")
        .env_remove("LEND_LOG")
        .env("XDG_CONFIG_HOME", std::env::temp_dir().join("lend-cli-tests-config"));
    cmd
}

/// Create a temporary directory and initialize a lend project
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    lend_cmd().arg("init").arg(dir.path()).assert().success();
    dir
}

/// Run a command in the project with JSON output and parse stdout
fn json(dir: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = lend_cmd()
        .current_dir(dir.path())
        .args(["--format", "json"])
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "lend {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

/// Project with an admin, a member, one category, one tag, and one task
///
/// Returns the directory and the task ID.
fn setup_catalog() -> (TempDir, String) {
    let dir = setup_project();
    json(&dir, &["user", "register", ADMIN]);
    json(&dir, &["user", "register", MEMBER, "--nickname", "Mem"]);
    json(&dir, &["--as", ADMIN, "category", "add", "Power tools"]);
    json(&dir, &["--as", ADMIN, "tag", "add", "cordless"]);

    let task = json(
        &dir,
        &[
            "--as",
            ADMIN,
            "task",
            "add",
            "Cordless drill",
            "--category",
            "power-tools",
            "--tag",
            "cordless",
        ],
    );
    let id = task["id"].as_str().unwrap().to_string();
    (dir, id)
}

fn status_of(dir: &TempDir, id: &str) -> String {
    let task = json(dir, &["task", "show", id]);
    task["reservation_status"].as_str().unwrap().to_string()
}

// =============================================================================
// Initialization Tests
// =============================================================================

#[test]
fn test_init_creates_structure() {
    let dir = TempDir::new().unwrap();

    lend_cmd()
        .arg("init")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized lend project"));

    assert!(dir.path().join(".lend").is_dir());
    assert!(dir.path().join(".lend/config.toml").is_file());
    assert!(dir.path().join(".lend/.gitignore").is_file());
}

#[test]
fn test_init_is_idempotent() {
    let dir = TempDir::new().unwrap();

    lend_cmd().arg("init").arg(dir.path()).assert().success();
    lend_cmd().arg("init").arg(dir.path()).assert().success();
}

#[test]
fn test_not_in_project_error() {
    let dir = TempDir::new().unwrap();

    lend_cmd()
        .current_dir(dir.path())
        .args(["task", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not in a lend project"));
}

// =============================================================================
// User Tests
// =============================================================================

#[test]
fn test_first_registered_user_is_admin() {
    let dir = setup_project();

    lend_cmd()
        .current_dir(dir.path())
        .args(["user", "register", ADMIN])
        .assert()
        .success()
        .stdout(predicate::str::contains("(admin)"));

    let member = json(&dir, &["user", "register", MEMBER]);
    assert_eq!(member["admin"], false);
}

#[test]
fn test_duplicate_registration_fails() {
    let dir = setup_project();
    json(&dir, &["user", "register", ADMIN]);

    lend_cmd()
        .current_dir(dir.path())
        .args(["user", "register", "Admin@Example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_whoami_reports_identity() {
    let dir = setup_project();
    json(&dir, &["user", "register", ADMIN]);

    lend_cmd()
        .current_dir(dir.path())
        .args(["user", "whoami"])
        .assert()
        .success()
        .stdout(predicate::str::contains("anonymous"));

    lend_cmd()
        .current_dir(dir.path())
        .env("LEND_USER", ADMIN)
        .args(["user", "whoami"])
        .assert()
        .success()
        .stdout(predicate::str::contains(ADMIN))
        .stdout(predicate::str::contains("admin"));
}

#[test]
fn test_unknown_acting_user_fails() {
    let dir = setup_project();

    lend_cmd()
        .current_dir(dir.path())
        .args(["--as", "ghost@example.com", "task", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("User not found"));
}

#[test]
fn test_grant_and_revoke_admin() {
    let (dir, _) = setup_catalog();

    let member = json(&dir, &["--as", ADMIN, "user", "grant-admin", MEMBER]);
    assert_eq!(member["admin"], true);

    let member = json(&dir, &["--as", ADMIN, "user", "revoke-admin", MEMBER]);
    assert_eq!(member["admin"], false);

    lend_cmd()
        .current_dir(dir.path())
        .args(["--as", ADMIN, "user", "revoke-admin", ADMIN])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot revoke their own"));
}

#[test]
fn test_admin_edits_user() {
    let (dir, _) = setup_catalog();

    let member = json(
        &dir,
        &[
            "--as",
            ADMIN,
            "user",
            "edit",
            MEMBER,
            "--email",
            "Renamed@Example.com",
            "--clear-nickname",
        ],
    );
    assert_eq!(member["email"], "renamed@example.com");
    assert!(member["nickname"].is_null());

    lend_cmd()
        .current_dir(dir.path())
        .args(["--as", ADMIN, "user", "edit", "renamed@example.com", "--email", ADMIN])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    lend_cmd()
        .current_dir(dir.path())
        .args(["--as", "renamed@example.com", "user", "edit", ADMIN, "--nickname", "Boss"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("admin role required"));

    lend_cmd()
        .current_dir(dir.path())
        .args(["--as", ADMIN, "user", "edit", ADMIN])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to change"));
}

// =============================================================================
// Catalog Tests
// =============================================================================

#[test]
fn test_task_add_and_list() {
    let (dir, id) = setup_catalog();

    lend_cmd()
        .current_dir(dir.path())
        .args(["task", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cordless drill"))
        .stdout(predicate::str::contains(id.as_str()))
        .stdout(predicate::str::contains("Page 1 of 1"));

    let page = json(&dir, &["task", "list", "--tag", "cordless"]);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["tags"][0], "cordless");
    assert_eq!(page["items"][0]["availability"], "available");
}

#[test]
fn test_task_add_requires_admin() {
    let (dir, _) = setup_catalog();

    lend_cmd()
        .current_dir(dir.path())
        .args(["--as", MEMBER, "task", "add", "Ladder", "-c", "power-tools"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("admin role required"));
}

#[test]
fn test_task_show_and_edit() {
    let (dir, id) = setup_catalog();

    lend_cmd()
        .current_dir(dir.path())
        .args(["task", "show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cordless drill"))
        .stdout(predicate::str::contains("Power tools"))
        .stdout(predicate::str::contains("cordless"));

    let task = json(
        &dir,
        &[
            "--as", ADMIN, "task", "edit", &id, "--title", "Hammer drill", "--untag", "cordless",
            "--comment", "18V",
        ],
    );
    assert_eq!(task["title"], "Hammer drill");
    assert_eq!(task["comment"], "18V");
    assert_eq!(task["tags"].as_array().unwrap().len(), 0);
}

#[test]
fn test_task_invalid_id_error() {
    let (dir, _) = setup_catalog();

    lend_cmd()
        .current_dir(dir.path())
        .args(["task", "show", "not-an-id"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid"));
}

#[test]
fn test_category_in_use_cannot_be_deleted() {
    let (dir, id) = setup_catalog();

    lend_cmd()
        .current_dir(dir.path())
        .args(["--as", ADMIN, "category", "delete", "power-tools"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("still has 1 task"));

    json(&dir, &["--as", ADMIN, "task", "delete", &id]);
    json(&dir, &["--as", ADMIN, "category", "delete", "power-tools"]);

    let categories = json(&dir, &["category", "list"]);
    assert_eq!(categories.as_array().unwrap().len(), 0);
}

#[test]
fn test_tag_delete_detaches_from_tasks() {
    let (dir, id) = setup_catalog();

    lend_cmd()
        .current_dir(dir.path())
        .args(["--as", ADMIN, "tag", "delete", "cordless"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted tag"));

    let task = json(&dir, &["task", "show", &id]);
    assert_eq!(task["tags"].as_array().unwrap().len(), 0);
}

#[test]
fn test_duplicate_tag_title_is_rejected() {
    let (dir, _) = setup_catalog();

    lend_cmd()
        .current_dir(dir.path())
        .args(["--as", ADMIN, "tag", "add", "Cordless"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

// =============================================================================
// Reservation Workflow Tests
// =============================================================================

#[test]
fn test_guest_reservation_full_cycle() {
    let (dir, id) = setup_catalog();

    lend_cmd()
        .current_dir(dir.path())
        .args([
            "task", "reserve", &id, "-m", "For the weekend", "--email", "guest@example.com",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("now pending"));

    let task = json(&dir, &["task", "show", &id]);
    assert_eq!(task["reserver"]["kind"], "guest");
    assert_eq!(task["reserver"]["email"], "guest@example.com");
    assert_eq!(task["availability"], "available");

    for (action, status) in [
        ("approve", "approved"),
        ("lend", "lent"),
        ("return", "returned"),
        ("lend", "lent"),
    ] {
        lend_cmd()
            .current_dir(dir.path())
            .args(["--as", ADMIN, "admin", action, &id])
            .assert()
            .success();
        assert_eq!(status_of(&dir, &id), status);
    }

    let task = json(&dir, &["task", "show", &id]);
    assert_eq!(task["availability"], "lent");
}

#[test]
fn test_guest_email_is_normalized() {
    let (dir, id) = setup_catalog();
    json(
        &dir,
        &["task", "reserve", &id, "-m", "Please", "--email", " Gus@Example.COM "],
    );

    let task = json(&dir, &["task", "show", &id]);
    assert_eq!(task["reserver"]["email"], "gus@example.com");
}

#[test]
fn test_member_cannot_pass_guest_email() {
    let (dir, id) = setup_catalog();

    lend_cmd()
        .current_dir(dir.path())
        .args([
            "--as", MEMBER, "task", "reserve", &id, "-m", "Mine", "--email", "other@example.com",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--email is for guests"));

    assert_eq!(status_of(&dir, &id), "available");
}

#[test]
fn test_guest_reservation_requires_email() {
    let (dir, id) = setup_catalog();

    lend_cmd()
        .current_dir(dir.path())
        .args(["task", "reserve", &id, "-m", "Please"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--email"));

    assert_eq!(status_of(&dir, &id), "available");
}

#[test]
fn test_member_reservation_is_reserved() {
    let (dir, id) = setup_catalog();

    let outcome = json(
        &dir,
        &["--as", MEMBER, "task", "reserve", &id, "-m", "Need it", "--nickname", "Mem"],
    );
    assert_eq!(outcome["applied"], true);
    assert_eq!(outcome["reservation_status"], "reserved");

    let mine = json(&dir, &["--as", MEMBER, "reservations"]);
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["id"], id.as_str());
}

#[test]
fn test_second_reservation_is_ignored() {
    let (dir, id) = setup_catalog();
    json(&dir, &["--as", MEMBER, "task", "reserve", &id, "-m", "First"]);

    lend_cmd()
        .current_dir(dir.path())
        .args(["--as", ADMIN, "task", "reserve", &id, "-m", "Second"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Note:"));

    let task = json(&dir, &["task", "show", &id]);
    assert_eq!(task["reservation_comment"], "First");
}

#[test]
fn test_reject_then_approve_is_ignored() {
    let (dir, id) = setup_catalog();
    json(&dir, &["--as", MEMBER, "task", "reserve", &id, "-m", "Need it"]);
    json(&dir, &["--as", ADMIN, "admin", "reject", &id]);

    lend_cmd()
        .current_dir(dir.path())
        .args(["--as", ADMIN, "admin", "approve", &id])
        .assert()
        .success()
        .stderr(predicate::str::contains("Note:"))
        .stderr(predicate::str::contains("cannot approve"));

    let outcome = json(&dir, &["--as", ADMIN, "admin", "approve", &id]);
    assert_eq!(outcome["applied"], false);
    assert!(outcome["reason"].is_string());
    assert_eq!(status_of(&dir, &id), "rejected");
}

#[test]
fn test_ignored_action_reports_reason_in_json() {
    let (dir, id) = setup_catalog();

    let outcome = json(&dir, &["--as", ADMIN, "admin", "return", &id]);
    assert_eq!(outcome["applied"], false);
    assert_eq!(outcome["reservation_status"], "available");
    assert!(outcome["reason"].as_str().unwrap().contains("available"));

    assert_eq!(status_of(&dir, &id), "available");
}

#[test]
fn test_reset_puts_task_back_on_shelf() {
    let (dir, id) = setup_catalog();
    json(&dir, &["--as", MEMBER, "task", "reserve", &id, "-m", "Need it"]);
    json(&dir, &["--as", ADMIN, "admin", "reject", &id]);
    json(&dir, &["--as", ADMIN, "admin", "reset", &id]);

    let task = json(&dir, &["task", "show", &id]);
    assert_eq!(task["reservation_status"], "available");
    assert!(task["reserver"].is_null());

    let outcome = json(&dir, &["--as", MEMBER, "task", "reserve", &id, "-m", "Again"]);
    assert_eq!(outcome["applied"], true);
}

#[test]
fn test_workflow_actions_require_admin() {
    let (dir, id) = setup_catalog();
    json(&dir, &["--as", MEMBER, "task", "reserve", &id, "-m", "Need it"]);

    lend_cmd()
        .current_dir(dir.path())
        .args(["--as", MEMBER, "admin", "approve", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("admin role required"));

    lend_cmd()
        .current_dir(dir.path())
        .args(["admin", "queue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("admin role required"));

    assert_eq!(status_of(&dir, &id), "reserved");
}

#[test]
fn test_workflow_action_on_missing_task() {
    let (dir, id) = setup_catalog();
    json(&dir, &["--as", ADMIN, "task", "delete", &id]);

    lend_cmd()
        .current_dir(dir.path())
        .args(["--as", ADMIN, "admin", "approve", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_admin_queue_lists_requests() {
    let (dir, id) = setup_catalog();

    lend_cmd()
        .current_dir(dir.path())
        .args(["--as", ADMIN, "admin", "queue"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No reservations in progress"));

    json(&dir, &["--as", MEMBER, "task", "reserve", &id, "-m", "Need it"]);

    let queue = json(&dir, &["--as", ADMIN, "admin", "queue"]);
    assert_eq!(queue.as_array().unwrap().len(), 1);
    assert_eq!(queue[0]["reservation_status"], "reserved");
}

#[test]
fn test_list_filters_by_status_and_availability() {
    let (dir, id) = setup_catalog();
    json(
        &dir,
        &["--as", ADMIN, "task", "add", "Tent", "--category", "power-tools"],
    );
    json(&dir, &["--as", MEMBER, "task", "reserve", &id, "-m", "Need it"]);
    json(&dir, &["--as", ADMIN, "admin", "approve", &id]);
    json(&dir, &["--as", ADMIN, "admin", "lend", &id]);

    let lent = json(&dir, &["task", "list", "--availability", "lent"]);
    assert_eq!(lent["total"], 1);
    assert_eq!(lent["items"][0]["id"], id.as_str());

    let available = json(&dir, &["task", "list", "--status", "available"]);
    assert_eq!(available["total"], 1);
    assert_eq!(available["items"][0]["title"], "Tent");
}

#[test]
fn test_browse_shows_only_available_tasks() {
    let (dir, id) = setup_catalog();
    json(&dir, &["--as", ADMIN, "category", "add", "Camping"]);
    json(
        &dir,
        &["--as", ADMIN, "task", "add", "Tent", "--category", "camping"],
    );

    let all = json(&dir, &["browse"]);
    assert_eq!(all["total"], 2);

    json(&dir, &["--as", MEMBER, "task", "reserve", &id, "-m", "Need it"]);

    let all = json(&dir, &["browse"]);
    assert_eq!(all["total"], 1);
    assert_eq!(all["items"][0]["title"], "Tent");

    let tagged = json(&dir, &["browse", "--tag", "cordless"]);
    assert_eq!(tagged["total"], 0);

    let camping = json(&dir, &["browse", "--category", "camping"]);
    assert_eq!(camping["total"], 1);

    lend_cmd()
        .current_dir(dir.path())
        .args(["browse", "--category", "power-tools"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No tasks found."));
}

// =============================================================================
// Status and Configuration Tests
// =============================================================================

#[test]
fn test_status_shows_overview() {
    let (dir, id) = setup_catalog();
    json(&dir, &["--as", MEMBER, "task", "reserve", &id, "-m", "Need it"]);

    lend_cmd()
        .current_dir(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Tasks: 1"))
        .stdout(predicate::str::contains("1 awaiting review"))
        .stdout(predicate::str::contains("Users: 2"));

    let status = json(&dir, &["status"]);
    assert_eq!(status["tasks"], 1);
    assert_eq!(status["by_status"]["reserved"], 1);
}

#[test]
fn test_configured_identity_is_used() {
    let (dir, _) = setup_catalog();
    fs::write(
        dir.path().join(".lend/config.toml"),
        format!("[identity]\nuser = \"{}\"\n", ADMIN),
    )
    .unwrap();

    lend_cmd()
        .current_dir(dir.path())
        .args(["admin", "queue"])
        .assert()
        .success();
}

#[test]
fn test_page_size_from_config() {
    let (dir, _) = setup_catalog();
    for title in ["Tent", "Ladder"] {
        json(&dir, &["--as", ADMIN, "task", "add", title, "-c", "power-tools"]);
    }
    fs::write(
        dir.path().join(".lend/config.toml"),
        "[catalog]\npage_size = 2\n",
    )
    .unwrap();

    let first = json(&dir, &["task", "list"]);
    assert_eq!(first["items"].as_array().unwrap().len(), 2);
    assert_eq!(first["total"], 3);

    let second = json(&dir, &["task", "list", "--page", "2"]);
    assert_eq!(second["items"].as_array().unwrap().len(), 1);
}

#[test]
fn test_verbose_flag() {
    let dir = setup_project();

    lend_cmd()
        .current_dir(dir.path())
        .args(["--verbose", "status"])
        .assert()
        .success();
}
