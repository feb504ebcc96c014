/// End-to-end tests for the extract and merge commands
use flate2::write::GzEncoder;
use flate2::Compression;
use insider_session_features::activity::parser::event_columns;
use insider_session_features::commands::extract::{extract, run, ExtractOptions};
use insider_session_features::commands::{merge, schema};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ROSTER: &str = r#"{
    "users": [
        {"user": "ALICE", "role": "Engineer", "b_unit": "1", "f_unit": "Research",
         "dept": "Software", "team": "1", "pc": "PC-1", "supervisor": "BOB",
         "personality": {"o": 30, "c": 31, "e": 32, "a": 33, "n": 34}},
        {"user": "BOB", "role": "Manager", "b_unit": "1", "f_unit": "Research",
         "dept": "Software", "team": "1", "pc": "PC-2",
         "personality": {"o": 40, "c": 41, "e": 42, "a": 43, "n": 44}}
    ],
    "insiders": [
        {"user": "ALICE", "scenario": 1,
         "start": "01/11/2010 00:00:00", "end": "01/12/2010 00:00:00",
         "malicious_event_ids": ["evil-1"]}
    ]
}"#;

/// One CSV line in header order; unnamed attributes are empty.
fn row(id: &str, date: &str, user: &str, pc: &str, activity: &str, attrs: &[(&str, &str)]) -> String {
    event_columns()
        .into_iter()
        .map(|col| match col {
            "id" => id.to_string(),
            "date" => date.to_string(),
            "user" => user.to_string(),
            "pc" => pc.to_string(),
            "activity" => activity.to_string(),
            other => attrs
                .iter()
                .find(|(name, _)| *name == other)
                .map(|(_, v)| (*v).to_string())
                .unwrap_or_default(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn table(rows: &[String]) -> String {
    let mut text = event_columns().join(",");
    text.push('\n');
    for r in rows {
        text.push_str(r);
        text.push('\n');
    }
    text
}

fn week1() -> String {
    table(&[
        row("a1", "01/04/2010 08:00:00", "ALICE", "PC-1", "Logon", &[]),
        row("a2", "01/04/2010 08:20:00", "ALICE", "PC-1", "http", &[("url_len", "40"), ("http_type", "2")]),
        row("a3", "01/04/2010 09:00:00", "ALICE", "PC-1", "Logoff", &[]),
        row("b1", "01/04/2010 08:05:00", "BOB", "PC-2", "Logon", &[]),
        row("b2", "01/04/2010 08:15:00", "BOB", "PC-2", "email", &[("n_des", "3"), ("Xemail", "1")]),
    ])
}

fn week2() -> String {
    table(&[
        row("c1", "01/11/2010 20:00:00", "ALICE", "PC-2", "Logon", &[]),
        row("evil-1", "01/11/2010 20:10:00", "ALICE", "PC-2", "Connect", &[("usb_dur", "600")]),
        row("c3", "01/11/2010 20:30:00", "ALICE", "PC-2", "Logoff", &[]),
        row("x1", "01/11/2010 21:00:00", "MALLORY", "PC-9", "Logon", &[]),
        row("x2", "not a date", "BOB", "PC-2", "Logon", &[]),
    ])
}

struct Fixture {
    dir: TempDir,
    roster: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let roster = dir.path().join("roster.json");
        fs::write(&roster, ROSTER).unwrap();
        Self { dir, roster }
    }

    fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn out(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    fn options(&self) -> ExtractOptions {
        ExtractOptions::new(&self.roster, self.out())
    }
}

fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (header, rows)
}

fn column(header: &[String], name: &str) -> usize {
    header.iter().position(|h| h == name).unwrap()
}

#[test]
fn test_extract_two_weeks() {
    let fx = Fixture::new();
    let w1 = fx.write("1.csv", &week1());
    let w2 = fx.write("2.csv", &week2());

    let summary = extract(&[w2, w1], &fx.options()).unwrap();
    assert!(summary.is_success());
    assert_eq!(summary.reports.len(), 2);
    assert_eq!(summary.reports[0].week, 1);
    assert_eq!(summary.reports[0].sessions, 2);
    assert_eq!(summary.reports[1].sessions, 1);
    assert_eq!(summary.reports[1].insider_sessions, 1);
    assert_eq!(summary.reports[1].issues.len(), 2);
    assert!(fx.out().join("week_1.csv").exists());
    assert!(fx.out().join("week_2.csv").exists());

    let merged = summary.merged.clone().unwrap();
    assert_eq!(merged, fx.out().join("sessions.csv"));
    assert_eq!(summary.merged_rows, 3);

    let (header, rows) = read_csv(&merged);
    assert_eq!(header, schema::columns(false));
    assert_eq!(rows.len(), 3);

    let id = column(&header, "sessionid");
    let user = column(&header, "user");
    let ids: Vec<&str> = rows.iter().map(|r| r[id].as_str()).collect();
    // roster order within a week: ALICE then BOB
    assert_eq!(ids, vec!["100000", "100001", "200000"]);
    assert_eq!(rows[0][user], "0");
    assert_eq!(rows[1][user], "1");

    let insider = column(&header, "insider");
    assert_eq!(rows[0][insider], "0");
    assert_eq!(rows[2][insider], "1");

    // week 2: ALICE on her supervisor's machine, after hours
    let pc = column(&header, "pc");
    assert_eq!(rows[2][pc], "3");
    assert_eq!(rows[2][column(&header, "isafterhour")], "1");
    assert_eq!(rows[2][column(&header, "n_usb")], "1");
    assert_eq!(rows[2][column(&header, "usb_mean_usb_dur")], "600");

    // BOB's session was never logged off
    assert_eq!(rows[1][column(&header, "end_with")], "0");
    assert_eq!(rows[1][column(&header, "email_n-Xemail1")], "1");
    assert_eq!(rows[0][column(&header, "http_socnetf_mean_url_len")], "40");
}

#[test]
fn test_malicious_event_before_window_is_labeled_and_reported() {
    let fx = Fixture::new();
    // ALICE's window opens on 01/11; this week is 01/04
    let early = table(&[
        row("e1", "01/04/2010 08:00:00", "ALICE", "PC-1", "Logon", &[]),
        row("evil-1", "01/04/2010 08:30:00", "ALICE", "PC-1", "http", &[("url_len", "10")]),
        row("e2", "01/04/2010 08:45:00", "ALICE", "PC-1", "Logoff", &[]),
    ]);
    let w1 = fx.write("1.csv", &early);

    let summary = extract(&[w1], &fx.options()).unwrap();
    assert!(summary.is_success());
    let report = &summary.reports[0];
    assert_eq!(report.insider_sessions, 1);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("evil-1"));

    let (header, rows) = read_csv(&fx.out().join("week_1.csv"));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][column(&header, "insider")], "1");
}

#[test]
fn test_schema_drift_fails_only_that_week() {
    let fx = Fixture::new();
    let w1 = fx.write("1.csv", &week1());
    let drifted = week1().replacen("usb_dur", "usb_duration", 1);
    let w3 = fx.write("3.csv", &drifted);

    let summary = extract(&[w1.clone(), w3.clone()], &fx.options()).unwrap();
    assert!(!summary.is_success());
    assert_eq!(summary.reports.len(), 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].0, 3);
    assert!(summary.failures[0].1.contains("usb_dur"));
    assert!(fx.out().join("week_1.csv").exists());
    assert!(!fx.out().join("week_3.csv").exists());

    // the command itself reports failure
    let files = vec![
        w1.to_str().unwrap().to_string(),
        w3.to_str().unwrap().to_string(),
    ];
    let err = run(&files, &fx.options()).unwrap_err();
    assert!(err.to_string().contains("1 of 2 weeks failed"));
}

#[test]
fn test_rejects_file_lists_bad_records() {
    let fx = Fixture::new();
    let w2 = fx.write("2.csv", &week2());
    let rejects = fx.dir.path().join("rejects.csv");
    let options = ExtractOptions {
        rejects: Some(rejects.clone()),
        ..fx.options()
    };

    let summary = extract(&[w2], &options).unwrap();
    assert_eq!(summary.issues(), 2);

    let (header, rows) = read_csv(&rejects);
    assert_eq!(header, vec!["week", "line", "event_id", "error"]);
    assert_eq!(rows.len(), 2);
    // sorted by line: MALLORY on line 5, the bad date on line 6
    assert_eq!(rows[0][1], "5");
    assert_eq!(rows[0][2], "x1");
    assert!(rows[0][3].contains("MALLORY"));
    assert_eq!(rows[1][1], "6");
    assert!(rows[1][3].contains("not a date"));
}

#[test]
fn test_compressed_input_and_detailed_stats() {
    let fx = Fixture::new();
    let path = fx.dir.path().join("1.csv.gz");
    let mut encoder = GzEncoder::new(fs::File::create(&path).unwrap(), Compression::default());
    encoder.write_all(week1().as_bytes()).unwrap();
    encoder.finish().unwrap();

    let mut options = fx.options();
    options.config.detailed_stats = true;
    options.output = Some(fx.dir.path().join("all.csv"));

    let summary = extract(&[path], &options).unwrap();
    assert!(summary.is_success());
    let (header, rows) = read_csv(&fx.dir.path().join("all.csv"));
    assert_eq!(header, schema::columns(true));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][column(&header, "http_max_url_len")], "40");
    assert_eq!(rows[0][column(&header, "http_std_url_len")], "0");
}

#[test]
fn test_duplicate_week_is_rejected_up_front() {
    let fx = Fixture::new();
    let a = fx.write("4.csv", &week1());
    let b = fx.write("week_4.csv", &week1());
    assert!(extract(&[a, b], &fx.options()).is_err());
    assert!(!fx.out().exists());
}

#[test]
fn test_missing_roster_fails() {
    let fx = Fixture::new();
    let w1 = fx.write("1.csv", &week1());
    let options = ExtractOptions::new(fx.dir.path().join("nope.json"), fx.out());
    assert!(extract(&[w1], &options).is_err());
}

#[test]
fn test_merge_detects_header_mismatch() {
    let fx = Fixture::new();
    let w1 = fx.write("1.csv", &week1());
    let summary = extract(&[w1], &fx.options()).unwrap();
    let good = summary.reports[0].output.clone();
    let other = fx.write("other.csv", "starttime,endtime\n1,2\n");
    let out = fx.dir.path().join("merged.csv");

    let inputs = vec![
        good.to_str().unwrap().to_string(),
        other.to_str().unwrap().to_string(),
    ];
    assert!(merge::run(&inputs, out.to_str().unwrap()).is_err());
    assert!(!out.exists());

    let inputs = vec![
        good.to_str().unwrap().to_string(),
        good.to_str().unwrap().to_string(),
    ];
    merge::run(&inputs, out.to_str().unwrap()).unwrap();
    let (_, rows) = read_csv(&out);
    assert_eq!(rows.len(), 4);
}
