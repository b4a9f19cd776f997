//=====================================================
// File: bindings/local.rs
//=====================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Workspace-local tool bindings
// Objective: Implement tool.read/write/edit/ls/stat against the configured
//            workdir, honoring dry-run for anything that writes
//=====================================================

use super::{BindingContext, HostBinding, HostBindings};
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::value::{NativeArity, Value};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::fs;
use tracing::debug;

pub fn register(bindings: &mut HostBindings) {
    bindings.register("tool", "read", ReadFile);
    bindings.register("tool", "write", WriteFile);
    bindings.register("tool", "edit", EditFile);
    bindings.register("tool", "ls", ListDir);
    bindings.register("tool", "stat", StatPath);
}

fn string_arg<'a>(args: &'a [Value], index: usize, binding: &str) -> Result<&'a str, RuntimeError> {
    match args.get(index) {
        Some(Value::String(text)) => Ok(text),
        Some(other) => Err(RuntimeError::TypeError(format!(
            "{} expects a string for argument {}, got {}",
            binding,
            index + 1,
            other.type_name()
        ))),
        None => Err(RuntimeError::ArgumentError(format!(
            "{} is missing argument {}",
            binding,
            index + 1
        ))),
    }
}

fn report(path: &str, extra: impl IntoIterator<Item = (&'static str, Value)>) -> Value {
    let mut fields = BTreeMap::new();
    fields.insert("path".to_string(), Value::string(path));
    for (key, value) in extra {
        fields.insert(key.to_string(), value);
    }
    Value::dict(fields)
}

struct ReadFile;

#[async_trait(?Send)]
impl HostBinding for ReadFile {
    async fn call(&self, ctx: &BindingContext, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let path = string_arg(&args, 0, "tool.read")?;
        let contents = fs::read_to_string(ctx.resolve(path)).await?;
        Ok(Value::String(contents))
    }

    fn arity(&self) -> NativeArity {
        NativeArity::Exact(1)
    }
}

struct WriteFile;

#[async_trait(?Send)]
impl HostBinding for WriteFile {
    async fn call(&self, ctx: &BindingContext, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let path = string_arg(&args, 0, "tool.write")?;
        let contents = match args.get(1) {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let bytes = Value::Number(contents.len() as f64);
        if ctx.dry_run {
            debug!(path, "dry-run: skipping tool.write");
            return Ok(report(path, [("bytes", bytes), ("dryRun", Value::Bool(true))]));
        }
        let target = ctx.resolve(path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target, contents).await?;
        Ok(report(path, [("bytes", bytes)]))
    }

    fn arity(&self) -> NativeArity {
        NativeArity::Exact(2)
    }
}

/// Replaces the first occurrence of `old` with `new`.
struct EditFile;

#[async_trait(?Send)]
impl HostBinding for EditFile {
    async fn call(&self, ctx: &BindingContext, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let path = string_arg(&args, 0, "tool.edit")?;
        let old = string_arg(&args, 1, "tool.edit")?;
        let new = string_arg(&args, 2, "tool.edit")?;
        let target = ctx.resolve(path);
        let contents = fs::read_to_string(&target).await?;
        if !contents.contains(old) {
            return Err(RuntimeError::Host(format!(
                "tool.edit: text not found in {}",
                path
            )));
        }
        if ctx.dry_run {
            debug!(path, "dry-run: skipping tool.edit");
            return Ok(report(path, [("replaced", Value::Bool(true)), ("dryRun", Value::Bool(true))]));
        }
        fs::write(&target, contents.replacen(old, new, 1)).await?;
        Ok(report(path, [("replaced", Value::Bool(true))]))
    }

    fn arity(&self) -> NativeArity {
        NativeArity::Exact(3)
    }
}

struct ListDir;

#[async_trait(?Send)]
impl HostBinding for ListDir {
    async fn call(&self, ctx: &BindingContext, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let path = match args.first() {
            Some(_) => string_arg(&args, 0, "tool.ls")?,
            None => ".",
        };
        let mut entries = fs::read_dir(ctx.resolve(path)).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(Value::array(names.into_iter().map(Value::String).collect()))
    }

    fn arity(&self) -> NativeArity {
        NativeArity::Range { min: 0, max: Some(1) }
    }
}

struct StatPath;

#[async_trait(?Send)]
impl HostBinding for StatPath {
    async fn call(&self, ctx: &BindingContext, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let path = string_arg(&args, 0, "tool.stat")?;
        let metadata = fs::metadata(ctx.resolve(path)).await?;
        let modified = metadata
            .modified()
            .map(|time| Value::String(DateTime::<Utc>::from(time).to_rfc3339()))
            .unwrap_or(Value::Null);
        Ok(report(
            path,
            [
                ("size", Value::Number(metadata.len() as f64)),
                ("isFile", Value::Bool(metadata.is_file())),
                ("isDir", Value::Bool(metadata.is_dir())),
                ("modified", modified),
            ],
        ))
    }

    fn arity(&self) -> NativeArity {
        NativeArity::Exact(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ctx(dir: &std::path::Path, dry_run: bool) -> BindingContext {
        BindingContext {
            workdir: dir.to_path_buf(),
            dry_run,
            ..BindingContext::default()
        }
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let ctx = ctx(dir.path(), false);
        WriteFile
            .call(&ctx, vec![Value::string("nested/notes.txt"), Value::string("hello")])
            .await
            .unwrap();
        let read = ReadFile
            .call(&ctx, vec![Value::string("nested/notes.txt")])
            .await
            .unwrap();
        assert_eq!(read, Value::string("hello"));
    }

    #[tokio::test]
    async fn test_dry_run_leaves_disk_untouched() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "one two").unwrap();
        let ctx = ctx(dir.path(), true);

        WriteFile
            .call(&ctx, vec![Value::string("b.txt"), Value::string("x")])
            .await
            .unwrap();
        assert!(!dir.path().join("b.txt").exists());

        let report = EditFile
            .call(
                &ctx,
                vec![Value::string("a.txt"), Value::string("one"), Value::string("1")],
            )
            .await
            .unwrap();
        let Value::Dict(fields) = report else {
            panic!("expected dict");
        };
        assert_eq!(fields.borrow()["dryRun"], Value::Bool(true));
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "one two");
    }

    #[tokio::test]
    async fn test_edit_replaces_first_occurrence() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x x").unwrap();
        let ctx = ctx(dir.path(), false);
        EditFile
            .call(&ctx, vec![Value::string("a.txt"), Value::string("x"), Value::string("y")])
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "y x");

        let err = EditFile
            .call(&ctx, vec![Value::string("a.txt"), Value::string("zzz"), Value::string("y")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("text not found"));
    }

    #[tokio::test]
    async fn test_ls_and_stat() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.txt"), "12345").unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        let ctx = ctx(dir.path(), false);

        let listing = ListDir.call(&ctx, vec![]).await.unwrap();
        assert_eq!(listing, Value::array(vec![Value::string("a"), Value::string("b.txt")]));

        let Value::Dict(stat) = StatPath.call(&ctx, vec![Value::string("b.txt")]).await.unwrap() else {
            panic!("expected dict");
        };
        let stat = stat.borrow();
        assert_eq!(stat["size"], Value::Number(5.0));
        assert_eq!(stat["isFile"], Value::Bool(true));
        assert_eq!(stat["isDir"], Value::Bool(false));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = ReadFile
            .call(&ctx(dir.path(), false), vec![Value::string("nope.txt")])
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Io(_)));
    }
}

//=====================================================
// End of file
//=====================================================
