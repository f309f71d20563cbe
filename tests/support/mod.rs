#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use model_scaffold::{GenerationMode, ScaffoldConfig};
use tempfile::{TempDir, tempdir};

pub const MIGRATIONS: &str = "package database\n\nimport (\n\t\"api/models\"\n\t\"log\"\n)\n\nfunc migrateDb() {\n\terr := DB.AutoMigrate(\n\t\t&models.User{})\n\tif err != nil {\n\t\tlog.Fatal(\"Failed to migrate user, \", err)\n\t}\n}\n";

pub const SERVER: &str = "package server\n\nfunc SetupRoutes(api *fiber.Router) {\n\tcontrollersList := []controllers.Controller{\n\t\t&controllers.UserController{},\n\t}\n\tfor _, controller := range controllersList {\n\t\tcontroller.RegisterRoutes(*api)\n\t}\n}\n";

const TEMPLATE_FILES: &[&str] = &[
    "model.txt",
    "createDto.txt",
    "updateDto.txt",
    "controller.txt",
    "service.txt",
];

/// A throwaway copy of a layered Go service: models, controllers, dtos,
/// services, the two registration files and the fixture templates.
pub struct GoWorkspace {
    _tempdir: TempDir,
    root: PathBuf,
}

impl GoWorkspace {
    pub fn new() -> Self {
        let tempdir = tempdir().expect("tempdir");
        let root = tempdir.path().to_path_buf();
        let workspace = Self {
            _tempdir: tempdir,
            root,
        };
        for dir in ["models", "controllers", "dtos", "services", "template"] {
            fs::create_dir_all(workspace.path(dir)).expect("create dir");
        }
        workspace.write("database/dbMigrations.go", MIGRATIONS);
        workspace.write("server/server.go", SERVER);

        let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/template");
        for name in TEMPLATE_FILES {
            fs::copy(fixtures.join(name), workspace.path("template").join(name))
                .expect("copy template fixture");
        }
        workspace
    }

    /// Adds `type <Name> struct {` sources for each name to `models/`.
    pub fn with_models(self, names: &[&str]) -> Self {
        for name in names {
            let file = format!("models/{}.go", decapitalize(name));
            self.write(
                &file,
                &format!("package models\n\ntype {name} struct {{\n\tBaseModel\n}}\n"),
            );
        }
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dir");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).expect("read file")
    }

    pub fn config(&self, mode: GenerationMode) -> ScaffoldConfig {
        ScaffoldConfig::new(&self.root).with_mode(mode)
    }

    /// Files directly inside `dir`, sorted by name.
    pub fn list(&self, dir: &str) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.path(dir)) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The aligned field lines between `struct {` and the closing brace.
pub fn field_block(source: &str) -> Vec<String> {
    source
        .lines()
        .skip_while(|line| !line.trim_end().ends_with("struct {"))
        .skip(1)
        .take_while(|line| line.trim() != "}")
        .filter(|line| line.contains("`json:"))
        .map(str::to_string)
        .collect()
}
