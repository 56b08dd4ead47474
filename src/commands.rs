use std::fmt::Write as _;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use vox_core::Orchestrator;
use vox_embed::EmbeddingProvider;
use vox_store::{Document, DocumentId, NewDocument, Project};

use crate::cli::{Command, DocsAction, IndexAction, ProjectAction};

/// Command output: human text plus a JSON form for `--json`.
pub struct Output {
    pub text: String,
    pub json: serde_json::Value,
}

impl Output {
    fn new<T: Serialize>(text: impl Into<String>, value: &T) -> Result<Self> {
        Ok(Self {
            text: text.into(),
            json: serde_json::to_value(value).context("failed to encode output")?,
        })
    }

    fn message(text: impl Into<String>) -> Self {
        let text = text.into();
        let json = serde_json::json!({ "message": text });
        Self { text, json }
    }
}

fn project_line(p: &Project) -> String {
    format!("{}  {}  {}", p.id, p.name, p.path)
}

fn document_line(d: &Document) -> String {
    let title = d.title.as_deref().unwrap_or("(untitled)");
    format!("{}  [{}]  {}  {}", d.id, d.kind, title, d.created_at)
}

pub async fn run<P: EmbeddingProvider>(
    orch: &Orchestrator<P>,
    command: Command,
    cancel: &CancellationToken,
) -> Result<Output> {
    match command {
        Command::Project { action } => project(orch, action).await,
        Command::Docs { action } => docs(orch, action).await,
        Command::Index {
            action: IndexAction::Build { id, mode, force },
        } => {
            let report = orch
                .index(&id, mode, force, cancel)
                .await
                .with_context(|| format!("indexing project {id} failed"))?;
            Output::new(report.to_string(), &report)
        }
        Command::Search {
            query,
            project,
            mode,
            limit,
        } => {
            let outcome = orch.search(&query, project.as_deref(), mode, limit).await?;
            Output::new(outcome.to_string(), &outcome)
        }
        Command::Context { question, project } => {
            let context = orch.context(&question, &project).await?;
            Ok(Output {
                json: serde_json::json!({ "context": context }),
                text: context,
            })
        }
        Command::Skeleton { project, path } => {
            let skeleton = orch.file_skeleton(&project, &path).await?;
            Ok(Output {
                json: serde_json::json!({ "path": path, "skeleton": skeleton }),
                text: skeleton,
            })
        }
    }
}

async fn project<P: EmbeddingProvider>(
    orch: &Orchestrator<P>,
    action: ProjectAction,
) -> Result<Output> {
    match action {
        ProjectAction::Create { path, name } => {
            let p = orch.create_project(&path, name.as_deref()).await?;
            Output::new(format!("Project ready: {}", project_line(&p)), &p)
        }
        ProjectAction::List => {
            let projects = orch.list_projects().await?;
            let text = if projects.is_empty() {
                "No projects registered.".to_owned()
            } else {
                projects.iter().map(project_line).collect::<Vec<_>>().join("\n")
            };
            Output::new(text, &projects)
        }
        ProjectAction::Delete { id } => {
            let p = orch.delete_project(&id).await?;
            Output::new(format!("Deleted project {} ({})", p.name, p.id), &p)
        }
        ProjectAction::Stats { id } => {
            let stats = orch.project_stats(&id).await?;
            Output::new(stats.to_string(), &stats)
        }
        ProjectAction::Tree { id, refresh } => {
            let tree = orch.project_tree(&id, refresh).await?;
            Ok(Output {
                json: serde_json::json!({ "project_id": id, "tree": tree }),
                text: tree,
            })
        }
    }
}

async fn docs<P: EmbeddingProvider>(orch: &Orchestrator<P>, action: DocsAction) -> Result<Output> {
    match action {
        DocsAction::Add {
            project,
            kind,
            title,
            content,
            file,
        } => {
            let added = match (content, file) {
                (_, Some(path)) => {
                    orch.add_document_from_file(&project, kind, &path, title)
                        .await?
                }
                (Some(content), None) => {
                    let doc = NewDocument {
                        kind,
                        title,
                        content,
                        file_path: None,
                    };
                    orch.add_document(&project, &doc).await?
                }
                (None, None) => anyhow::bail!("either --content or --file is required"),
            };
            let mut text = format!("Added {}", document_line(&added.document));
            if !added.searchable {
                text.push_str("\nEmbedding failed; run `vox index build` to make it searchable.");
            }
            Ok(Output {
                json: serde_json::json!({
                    "document": added.document,
                    "searchable": added.searchable,
                }),
                text,
            })
        }
        DocsAction::List { project } => {
            let docs = orch.list_documents(&project).await?;
            let text = if docs.is_empty() {
                "No documents.".to_owned()
            } else {
                docs.iter().map(document_line).collect::<Vec<_>>().join("\n")
            };
            Output::new(text, &docs)
        }
        DocsAction::Get { project, id } => {
            let doc = orch.get_document(&project, DocumentId(id)).await?;
            let mut text = document_line(&doc);
            if let Some(path) = &doc.file_path {
                let _ = write!(text, "\nfile: {path}");
            }
            let _ = write!(text, "\n\n{}", doc.content);
            Output::new(text, &doc)
        }
        DocsAction::Delete { project, id } => {
            orch.delete_document(&project, DocumentId(id)).await?;
            Ok(Output::message(format!(
                "Deleted document {id}. Rebuild the index with --force to remove it from search."
            )))
        }
    }
}
