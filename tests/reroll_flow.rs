use reroll::commands::reroll::{Outcome, run as run_reroll};
use reroll::commands::update;
use reroll::git::GitRepo;
use reroll::git::test_utils::TmpRepo;
use reroll::prompt::ScriptedPrompter;
use std::fs;

// Keep the workflows from launching a real editor when rebase conflicts
// come up; `true` swallows its arguments and exits 0.
fn neuter_editor() {
    unsafe {
        std::env::set_var("REROLL_EDITOR", "true");
    }
}

fn open(tmp: &TmpRepo) -> GitRepo {
    let base = tmp.current_branch().unwrap();
    GitRepo::open(tmp.path(), Some(base)).unwrap()
}

fn serve_patch(server: &mut mockito::Server, name: &str, body: &str) -> String {
    server
        .mock("GET", format!("/files/{}", name).as_str())
        .with_status(200)
        .with_body(body)
        .create();
    format!("{}/files/{}", server.url(), name)
}

#[test]
fn test_patch_applying_cleanly_at_tip_stops_after_cleanup() {
    neuter_editor();
    let tmp = TmpRepo::new_with_base_commit().unwrap();
    let base = tmp.current_branch().unwrap();
    let repo = open(&tmp);

    let patch = tmp
        .make_patch(
            "notes.txt",
            "alpha\nbravo\ncharlie\ndelta\necho\nfoxtrot\ngolf\n",
            "9999-3.patch",
        )
        .unwrap();
    let body = fs::read_to_string(&patch).unwrap();
    fs::remove_file(&patch).unwrap();

    let mut server = mockito::Server::new();
    let url = serve_patch(&mut server, "9999-3.patch", &body);

    let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
    let outcome = run_reroll(&repo, &url, &mut prompter).unwrap();

    assert_eq!(outcome, Outcome::CleanApply);
    assert_eq!(outcome.exit_code(), 0);
    // cleanup ran: no stray branches, the download is gone, tree untouched
    assert_eq!(tmp.branch_names().unwrap(), vec![base]);
    assert!(!tmp.path().join("9999-3.patch").exists());
    assert_eq!(tmp.status_porcelain().unwrap(), "");
    // no prompts were needed on this path
    assert!(prompter.transcript.is_empty());
}

#[test]
fn test_patch_failing_even_at_older_date_halts_without_commit() {
    neuter_editor();
    let tmp = TmpRepo::new().unwrap();
    tmp.write_file("notes.txt", "alpha\nbravo\ncharlie\n", true)
        .unwrap();
    // 2020-01-01 00:00:00 UTC
    let first = tmp.commit_with_message_at("first", 1_577_836_800).unwrap();
    tmp.write_file("notes.txt", "ALPHA\nbravo\ncharlie\n", true)
        .unwrap();
    // 2023-01-01 12:00:00 UTC
    tmp.commit_with_message_at("second", 1_672_574_400).unwrap();
    let repo = open(&tmp);

    // context that never existed at any revision
    let body = "diff --git a/notes.txt b/notes.txt\n\
                --- a/notes.txt\n\
                +++ b/notes.txt\n\
                @@ -1,3 +1,3 @@\n\
                -a line that never existed\n\
                +rewritten\n\
                \x20bravo\n\
                \x20charlie\n";

    let mut server = mockito::Server::new();
    let url = serve_patch(&mut server, "4242-7.patch", body);

    let mut prompter = ScriptedPrompter::new(["2021-06-01", "4242-reroll"]);
    let outcome = run_reroll(&repo, &url, &mut prompter).unwrap();

    assert_eq!(outcome, Outcome::NeedsOlderDate);
    assert_eq!(outcome.exit_code(), 1);
    // the dated branch was created and checked out, but nothing committed
    assert_eq!(tmp.current_branch().unwrap(), "4242-reroll");
    assert_eq!(tmp.head_commit_id().unwrap(), first);
    // the download stays for the operator to inspect
    assert!(tmp.path().join("4242-7.patch").exists());
}

#[test]
fn test_reroll_pauses_when_the_rebase_conflicts() {
    neuter_editor();
    let tmp = TmpRepo::new().unwrap();
    tmp.write_file("notes.txt", "alpha\nbravo\ncharlie\n", true)
        .unwrap();
    let first = tmp.commit_with_message_at("first", 1_577_836_800).unwrap();
    tmp.write_file("notes.txt", "ALPHA\nbravo\ncharlie\n", true)
        .unwrap();
    tmp.commit_with_message_at("second", 1_672_574_400).unwrap();
    let repo = open(&tmp);

    // applies at `first` but not at the tip, and collides with the tip's
    // change to the same line once rebased
    let body = "diff --git a/notes.txt b/notes.txt\n\
                --- a/notes.txt\n\
                +++ b/notes.txt\n\
                @@ -1,3 +1,3 @@\n\
                -alpha\n\
                +alpha patched\n\
                \x20bravo\n\
                \x20charlie\n";

    let mut server = mockito::Server::new();
    let url = serve_patch(&mut server, "5150-2.patch", body);

    let mut prompter = ScriptedPrompter::new([
        "2021-06-01",                            // patch date
        "5150-reroll",                           // branch name
        "y",                                     // continue and rebase
        "http://example.org/node/5150#comment-2", // thread url
    ]);
    let outcome = run_reroll(&repo, &url, &mut prompter).unwrap();

    assert_eq!(outcome, Outcome::RebasePaused);
    assert_eq!(outcome.exit_code(), 1);
    // a rebase is genuinely in progress, waiting for the operator
    let git_dir = tmp.path().join(".git");
    assert!(
        git_dir.join("rebase-merge").exists() || git_dir.join("rebase-apply").exists(),
        "expected an in-progress rebase"
    );
    assert!(tmp.read_file("notes.txt").unwrap().contains("<<<<<<<"));
    // the reroll branch still starts from the dated commit
    let merge_base = tmp.git(&["merge-base", "5150-reroll", "HEAD"]).unwrap();
    assert!(String::from_utf8_lossy(&merge_base.stdout).contains(&first));
}

#[test]
fn test_operator_can_decline_after_the_real_apply() {
    neuter_editor();
    let tmp = TmpRepo::new().unwrap();
    tmp.write_file("notes.txt", "alpha\nbravo\ncharlie\n", true)
        .unwrap();
    tmp.commit_with_message_at("first", 1_577_836_800).unwrap();
    tmp.write_file("notes.txt", "ALPHA\nbravo\ncharlie\n", true)
        .unwrap();
    tmp.commit_with_message_at("second", 1_672_574_400).unwrap();
    let repo = open(&tmp);

    let body = "diff --git a/notes.txt b/notes.txt\n\
                --- a/notes.txt\n\
                +++ b/notes.txt\n\
                @@ -1,3 +1,3 @@\n\
                -alpha\n\
                +alpha patched\n\
                \x20bravo\n\
                \x20charlie\n";

    let mut server = mockito::Server::new();
    let url = serve_patch(&mut server, "6000-1.patch", body);

    let mut prompter = ScriptedPrompter::new(["2021-06-01", "6000-reroll", "no"]);
    let outcome = run_reroll(&repo, &url, &mut prompter).unwrap();

    assert_eq!(outcome, Outcome::Declined);
    assert_eq!(outcome.exit_code(), 1);
    // the apply went through and is left staged for inspection
    assert!(tmp.read_file("notes.txt").unwrap().contains("alpha patched"));
}

#[test]
fn test_update_stages_old_and_new_patch_branches() {
    neuter_editor();
    let tmp = TmpRepo::new_with_base_commit().unwrap();
    let repo = open(&tmp);

    let patch = tmp
        .make_patch(
            "notes.txt",
            "alpha\nbravo\ncharlie\ndelta\necho\nfoxtrot\ngolf\n",
            "7777-4.patch",
        )
        .unwrap();
    let body = fs::read_to_string(&patch).unwrap();
    fs::remove_file(&patch).unwrap();

    let mut server = mockito::Server::new();
    let url = serve_patch(&mut server, "7777-4.patch", &body);

    update::run(&repo, &url).unwrap();

    // the posted patch is committed on old_patch, work continues on new_patch
    assert_eq!(tmp.current_branch().unwrap(), "new_patch");
    assert!(tmp.branch_names().unwrap().contains(&"old_patch".to_string()));
    assert!(repo.is_ready_for_reroll().unwrap());
    assert!(tmp.read_file("notes.txt").unwrap().contains("golf"));
    // nothing left uncommitted besides the downloaded patch itself
    assert_eq!(tmp.status_porcelain().unwrap(), "?? 7777-4.patch\n");
}
