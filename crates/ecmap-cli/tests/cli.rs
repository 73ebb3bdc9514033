use clap::Parser;
use ecmap_cli::{read_schema_file, Cli};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};

const ZOO: &str = r#"
name = "Zoo"
alias = "zoo"

[[classes]]
name = "Animal"
map = { strategy = "TablePerHierarchy", table_name = "AnimalTable" }

[[classes.properties]]
name = "Name"
kind = "primitive"
type = "string"

[[classes]]
name = "Dog"
base = "Animal"

[[classes.properties]]
name = "Breed"
kind = "primitive"
type = "string"
"#;

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        console::set_colors_enabled(false);
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Runs one command line against the workspace database and returns its
    /// output.
    fn run(&self, args: &[&str]) -> anyhow::Result<String> {
        let database = self.path("zoo.db");
        let config = self.path("ecmap.toml");

        let mut argv = vec![
            "ecmap".to_string(),
            "--database".to_string(),
            database.display().to_string(),
            "--config".to_string(),
            config.display().to_string(),
        ];
        argv.extend(args.iter().map(|arg| arg.to_string()));

        let cli = Cli::try_parse_from(argv)?;
        let app = cli.open()?;

        let mut out = vec![];
        app.run(cli.command, &mut out)?;
        Ok(String::from_utf8(out)?)
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn import_then_inspect() {
    let ws = Workspace::new();
    let zoo = path_arg(&ws.write("zoo.toml", ZOO));

    let out = ws.run(&["import", &zoo]).unwrap();
    assert!(out.contains("CREATE TABLE [AnimalTable]"), "{out}");
    assert!(out.contains("Imported Zoo (2 classes, 1 tables, 2 views updated)"), "{out}");

    // A second import finds nothing to do.
    let out = ws.run(&["import", &zoo]).unwrap();
    assert!(out.contains("Database is up to date."), "{out}");

    let out = ws.run(&["ddl", "AnimalTable"]).unwrap();
    assert_eq!(
        out.trim(),
        "CREATE TABLE [AnimalTable] ([ECInstanceId] INTEGER PRIMARY KEY, \
         [ECClassId] INTEGER NOT NULL, [Name] TEXT, [Breed] TEXT);"
    );

    let out = ws.run(&["tables"]).unwrap();
    assert_eq!(out.trim(), "→ AnimalTable (Physical, 4 columns)");

    let out = ws.run(&["view", "Zoo:Dog", "--exact"]).unwrap();
    assert!(out.contains("zoo_Dog_View"), "{out}");
    assert!(out.contains("FROM [AnimalTable] WHERE [AnimalTable].[ECClassId] IN ("), "{out}");
    assert!(out.contains("→ Breed String"), "{out}");
}

#[test]
fn unknown_tables_and_classes_fail() {
    let ws = Workspace::new();
    let zoo = path_arg(&ws.write("zoo.toml", ZOO));
    ws.run(&["import", &zoo]).unwrap();

    assert!(ws.run(&["ddl", "Nope"]).is_err());
    assert!(ws.run(&["view", "Zoo:Cat"]).is_err());
}

#[test]
fn config_file_supplies_the_database() {
    let ws = Workspace::new();
    let zoo = path_arg(&ws.write("zoo.toml", ZOO));
    let config = ws.write(
        "custom.toml",
        &format!(
            "[database]\npath = {:?}\n\n[mapping]\ncreate_views = false\n",
            ws.path("configured.db").display().to_string()
        ),
    );

    let config = path_arg(&config);
    let cli = Cli::try_parse_from(["ecmap", "--config", config.as_str(), "import", zoo.as_str()]).unwrap();
    let app = cli.open().unwrap();

    let mut out = vec![];
    app.run(cli.command, &mut out).unwrap();

    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("0 views updated"), "{out}");
    assert!(ws.path("configured.db").exists());
}

#[test]
fn a_database_is_required() {
    let ws = Workspace::new();
    let missing = path_arg(&ws.path("missing.toml"));

    let cli = Cli::try_parse_from(["ecmap", "--config", missing.as_str(), "tables"]).unwrap();
    let err = cli.open().err().unwrap();
    assert!(err.to_string().contains("no database given"), "{err}");
}

#[test]
fn schema_files_are_read_by_extension() {
    let ws = Workspace::new();

    let from_toml = read_schema_file(ws.write("zoo.toml", ZOO)).unwrap();
    let json = serde_json::to_string(&from_toml).unwrap();
    let from_json = read_schema_file(ws.write("zoo.json", &json)).unwrap();
    assert_eq!(from_toml, from_json);
    assert_eq!(from_toml.classes.len(), 2);

    let err = read_schema_file(ws.write("zoo.yaml", ZOO)).unwrap_err();
    assert!(err.to_string().contains("expected .toml or .json"), "{err}");
}
