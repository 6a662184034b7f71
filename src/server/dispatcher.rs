//! Request routing to the collection store.
//!
//! # Responsibilities
//! - Serialize work per user (lock held across load → mutate → save)
//! - Run the operation against a fresh `UserContext`
//! - Persist mutations according to the configured write mode
//! - Turn outcomes and store errors into responses

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{StorageConfig, WriteMode};
use crate::observability::metrics;
use crate::protocol::{Command, Request, RequestKind, Response};
use crate::store::{StoreError, UserContext, UserDir, UserLocks};

/// Executes decoded requests. Shared by all connections.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    data_dir: PathBuf,
    write_mode: WriteMode,
    locks: UserLocks,
}

impl Dispatcher {
    pub fn new(storage: &StorageConfig) -> Self {
        Self {
            data_dir: storage.data_dir.clone(),
            write_mode: storage.write_mode,
            locks: UserLocks::new(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Execute `request` and build its response. Never fails; every error
    /// becomes a response.
    pub async fn dispatch(&self, request: Request) -> Response {
        let start = Instant::now();
        let kind = request.kind();

        tracing::info!(
            kind = %kind,
            user = %request.user,
            mutation = kind.is_mutation(),
            "Handling request"
        );

        // Only valid usernames get a lock entry.
        let response = match UserDir::new(&self.data_dir, &request.user) {
            Ok(dir) => {
                let _guard = self.locks.lock(&request.user).await;
                match self.execute(request, dir).await {
                    Ok(response) => response,
                    Err(e) => failure(kind, e),
                }
            }
            Err(e) => failure(kind, e),
        };

        metrics::record_request(kind.as_str(), response.success, start);
        tracing::debug!(
            kind = %kind,
            success = response.success,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request handled"
        );
        response
    }

    async fn execute(&self, request: Request, dir: UserDir) -> Result<Response, StoreError> {
        let Request { user, command } = request;
        let mut ctx = UserContext::open_dir(&user, dir).await?;

        match command {
            Command::Add(funko) => {
                let added = ctx.add_item(funko)?.clone();
                self.persist(&ctx, &added.id).await?;
                Ok(
                    Response::ok(RequestKind::Add, format!("Funko {} added successfully", added.name))
                        .with_item(added),
                )
            }
            Command::Update { id, patch } => {
                let updated = ctx.update_item(&id, patch)?.clone();
                self.persist(&ctx, &id).await?;
                Ok(Response::ok(
                    RequestKind::Update,
                    format!("Funko with ID {id} updated successfully"),
                )
                .with_item(updated))
            }
            Command::Remove { id } => {
                ctx.remove_item(&id).await?;
                if self.write_mode == WriteMode::Full {
                    ctx.save_collection().await?;
                }
                Ok(Response::ok(
                    RequestKind::Remove,
                    format!("Funko with ID {id} removed successfully"),
                ))
            }
            Command::Show { id } => {
                let funko = ctx
                    .collection()
                    .get(&id)
                    .cloned()
                    .ok_or(StoreError::NotFound(id.clone()))?;
                Ok(Response::ok(RequestKind::Show, format!("Funko with ID {id} found")).with_item(funko))
            }
            Command::List => {
                let funkos = ctx.collection().list().to_vec();
                if funkos.is_empty() {
                    return Ok(Response::fail(RequestKind::List, "No Funkos found"));
                }
                Ok(Response::ok(RequestKind::List, "Funkos found").with_items(funkos))
            }
        }
    }

    async fn persist(&self, ctx: &UserContext, id: &str) -> Result<(), StoreError> {
        match self.write_mode {
            WriteMode::Changed => ctx.persist(id).await,
            WriteMode::Full => ctx.save_collection().await,
        }
    }
}

fn failure(kind: RequestKind, err: StoreError) -> Response {
    if err.is_storage_fault() {
        tracing::error!(kind = %kind, error = %err, "Storage fault");
        return Response::fail(kind, format!("Storage error: {err}"));
    }
    match err {
        StoreError::InvalidUsername(_) => Response::error(err.to_string()),
        other => Response::fail(kind, other.to_string()),
    }
}
