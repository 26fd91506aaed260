//! Scaffolding for new applications and their controllers, models and migrations.

mod templates;

use std::path::{Path, PathBuf};

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};

use templates::*;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("invalid name {0:?}: start with a letter, then letters, digits, '_' or '-'")]
    InvalidName(String),
    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

const APP_DIRS: &[&str] = &[
    "src/controllers",
    "src/models",
    "src/views",
    "config",
    "migrations",
    "public/assets",
    "routes",
];

/// Creates `parent/<name>` with the standard directory tree and starter files.
pub fn create_new_app(parent: &Path, name: &str) -> Result<PathBuf, GenerateError> {
    validate_name(name)?;
    let root = parent.join(name);
    if root.exists() && !is_empty_dir(&root) {
        return Err(GenerateError::AlreadyExists(root));
    }

    for dir in APP_DIRS {
        let path = root.join(dir);
        std::fs::create_dir_all(&path).map_err(|source| GenerateError::Io { path, source })?;
    }

    let crate_name = snake_case(name);
    let render = |tpl: &str| tpl.replace("__APP__", name).replace("__CRATE__", &crate_name);
    let files = [
        ("Cargo.toml", render(APP_CARGO_TOML)),
        ("src/main.rs", render(APP_MAIN_RS)),
        ("config/config.yaml", APP_CONFIG_YAML.to_string()),
        ("routes/routes.rs", render(APP_ROUTES_RS)),
        ("README.md", render(APP_README_MD)),
        (".gitignore", APP_GITIGNORE.to_string()),
        (
            "src/controllers/application_controller.rs",
            APPLICATION_CONTROLLER_RS.to_string(),
        ),
    ];
    for (rel, content) in files {
        write_file(&root.join(rel), &content)?;
    }
    Ok(root)
}

/// Writes `src/controllers/<name>_controller.rs` under `root`.
pub fn generate_controller(root: &Path, name: &str) -> Result<PathBuf, GenerateError> {
    validate_name(name)?;
    let snake = snake_case(name);
    let content = CONTROLLER_RS
        .replace("__PLURAL__", &pluralize(&snake))
        .replace("__SNAKE__", &snake);

    let path = root
        .join("src/controllers")
        .join(format!("{snake}_controller.rs"));
    write_new_file(&path, &content)?;
    Ok(path)
}

/// Writes `src/models/<name>.rs`. Fields are `name:type`; malformed specs are skipped.
pub fn generate_model(root: &Path, name: &str, fields: &[String]) -> Result<PathBuf, GenerateError> {
    validate_name(name)?;
    let snake = snake_case(name);

    let mut declarations = String::new();
    for spec in fields {
        match parse_field(spec) {
            Some((field, ty)) => declarations.push_str(&format!("    pub {field}: {ty},\n")),
            None => warn!(field = %spec, "skipping malformed field spec, expected name:type"),
        }
    }

    let content = MODEL_RS
        .replace("__PASCAL__", &pascal_case(name))
        .replace("__TABLE__", &pluralize(&snake))
        .replace("__FIELDS__", &declarations);

    let path = root.join("src/models").join(format!("{snake}.rs"));
    write_new_file(&path, &content)?;
    Ok(path)
}

/// Writes `migrations/<YYYYMMDDHHMMSS>_<name>.sql`.
pub fn generate_migration(
    root: &Path,
    name: &str,
    now: OffsetDateTime,
) -> Result<PathBuf, GenerateError> {
    validate_name(name)?;
    let snake = snake_case(name);
    let stamp = format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    );

    let path = root.join("migrations").join(format!("{stamp}_{snake}.sql"));
    write_new_file(&path, &MIGRATION_SQL.replace("__SNAKE__", &snake))?;
    Ok(path)
}

/// Maps a generator field type to the Rust type used in the model struct.
pub fn rust_type(field_type: &str) -> &'static str {
    match field_type {
        "string" | "text" => "String",
        "integer" | "int" => "i32",
        "bigint" => "i64",
        "float" | "decimal" => "f64",
        "boolean" | "bool" => "bool",
        "datetime" | "timestamp" | "date" => "OffsetDateTime",
        _ => "String",
    }
}

fn parse_field(spec: &str) -> Option<(String, &'static str)> {
    let (name, ty) = spec.split_once(':')?;
    if ty.contains(':') || validate_name(name).is_err() {
        return None;
    }
    Some((snake_case(name), rust_type(ty)))
}

fn validate_name(name: &str) -> Result<(), GenerateError> {
    let mut chars = name.chars();
    let ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(GenerateError::InvalidName(name.to_string()))
    }
}

/// `UserProfile`, `user-profile` and `userProfile` all become `user_profile`.
pub(crate) fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' || c == '_' {
            if !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if (prev.is_ascii_lowercase() || prev.is_ascii_digit())
                || (prev.is_ascii_uppercase() && next_lower)
            {
                if !out.ends_with('_') {
                    out.push('_');
                }
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

pub(crate) fn pascal_case(name: &str) -> String {
    snake_case(name)
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn pluralize(snake: &str) -> String {
    format!("{snake}s")
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

fn write_new_file(path: &Path, content: &str) -> Result<(), GenerateError> {
    if path.exists() {
        return Err(GenerateError::AlreadyExists(path.to_path_buf()));
    }
    write_file(path, content)
}

fn write_file(path: &Path, content: &str) -> Result<(), GenerateError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| GenerateError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, content).map_err(|source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "generated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn case_conversions() {
        assert_eq!(snake_case("UserProfile"), "user_profile");
        assert_eq!(snake_case("userProfile"), "user_profile");
        assert_eq!(snake_case("user-profile"), "user_profile");
        assert_eq!(snake_case("HTTPServer"), "http_server");
        assert_eq!(snake_case("post2Comment"), "post2_comment");
        assert_eq!(pascal_case("user_profile"), "UserProfile");
        assert_eq!(pascal_case("article"), "Article");
    }

    #[test]
    fn field_type_mapping() {
        assert_eq!(rust_type("text"), "String");
        assert_eq!(rust_type("int"), "i32");
        assert_eq!(rust_type("bigint"), "i64");
        assert_eq!(rust_type("decimal"), "f64");
        assert_eq!(rust_type("bool"), "bool");
        assert_eq!(rust_type("timestamp"), "OffsetDateTime");
        assert_eq!(rust_type("json"), "String");
    }

    #[test]
    fn new_app_creates_tree_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = create_new_app(dir.path(), "blog").unwrap();

        for d in APP_DIRS {
            assert!(root.join(d).is_dir(), "missing dir {d}");
        }
        let cargo = std::fs::read_to_string(root.join("Cargo.toml")).unwrap();
        assert!(cargo.contains("name = \"blog\""));
        let config = std::fs::read_to_string(root.join("config/config.yaml")).unwrap();
        assert!(config.contains("driver: sqlite3"));
        assert!(root.join(".gitignore").is_file());
        assert!(root.join("src/controllers/application_controller.rs").is_file());
    }

    #[test]
    fn new_app_refuses_non_empty_target() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("blog")).unwrap();
        std::fs::write(dir.path().join("blog/keep.txt"), "x").unwrap();

        let err = create_new_app(dir.path(), "blog").unwrap_err();
        assert!(matches!(err, GenerateError::AlreadyExists(_)));
    }

    #[test]
    fn invalid_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for bad in ["", "1st", "../escape", "has space"] {
            assert!(matches!(
                generate_controller(dir.path(), bad),
                Err(GenerateError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn controller_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = generate_controller(dir.path(), "Article").unwrap();
        assert_eq!(path, dir.path().join("src/controllers/article_controller.rs"));

        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains("/// GET /articles/:id"));
        assert!(body.contains("\"Index article\""));
        assert!(body.contains("pub async fn destroy"));

        let err = generate_controller(dir.path(), "Article").unwrap_err();
        assert!(matches!(err, GenerateError::AlreadyExists(_)));
    }

    #[test]
    fn model_file_maps_fields_and_skips_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let fields = vec![
            "title:string".to_string(),
            "views:integer".to_string(),
            "published:boolean".to_string(),
            "broken".to_string(),
            "a:b:c".to_string(),
        ];
        let path = generate_model(dir.path(), "BlogPost", &fields).unwrap();
        assert_eq!(path, dir.path().join("src/models/blog_post.rs"));

        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.contains("pub struct BlogPost {"));
        assert!(body.contains("pub title: String,"));
        assert!(body.contains("pub views: i32,"));
        assert!(body.contains("pub published: bool,"));
        assert!(!body.contains("broken"));
        assert!(body.contains("TABLE: &'static str = \"blog_posts\""));
    }

    #[test]
    fn migration_file_is_timestamped() {
        let dir = tempfile::tempdir().unwrap();
        let now = datetime!(2024-03-05 07:08:09 UTC);
        let path = generate_migration(dir.path(), "CreatePosts", now).unwrap();
        assert_eq!(
            path,
            dir.path().join("migrations/20240305070809_create_posts.sql")
        );
        let body = std::fs::read_to_string(path).unwrap();
        assert!(body.starts_with("-- create_posts"));
    }
}
