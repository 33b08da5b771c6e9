//! Synthetic CRUD routes for a data entity
//!
//! `table.crud::<Order, _>(repo)` registers:
//!
//! | Method | Path              | Handler                  |
//! |--------|-------------------|--------------------------|
//! | GET    | `/api/orders`     | `Repository::find_all`   |
//! | GET    | `/api/orders/:id` | `Repository::find_by_id` |
//! | POST   | `/api/orders`     | `Repository::save`       |
//! | DELETE | `/api/orders/:id` | `Repository::delete`     |
//!
//! Routes go through [`RouteTable::register_api`], so mount prefix, duplicate
//! policy and method rules apply exactly as for hand-written routes.

use std::marker::PhantomData;
use std::sync::Arc;

use http::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::error::Result;
use crate::handler::{Handler, HandlerError, HandlerResult, RequestContext};
use crate::route::PathPattern;
use crate::table::{RouteOptions, RouteTable};

/// A record type exposed through generated CRUD routes
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Singular name used to derive the default route prefix
    ///
    /// Defaults to the type's own name, so `Order` is served at `/api/orders`.
    fn entity_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }
}

/// Data-access collaborator the generated handlers delegate to
pub trait Repository<E: Entity>: Send + Sync + 'static {
    fn find_all(&self) -> anyhow::Result<Vec<E>>;

    fn find_by_id(&self, id: &str) -> anyhow::Result<Option<E>>;

    /// Persists `item` and returns the stored version
    fn save(&self, item: E) -> anyhow::Result<E>;

    /// Removes the record, returning it if it existed
    fn delete(&self, id: &str) -> anyhow::Result<Option<E>>;
}

/// Registers the four canonical CRUD routes for `E`
pub struct CrudGenerator<E> {
    prefix: Option<String>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> CrudGenerator<E> {
    pub fn new() -> Self {
        Self {
            prefix: None,
            _entity: PhantomData,
        }
    }

    /// Overrides the default `/api/<plural>` prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Prefix the routes are registered under, before the table's mount prefix
    pub fn prefix(&self, table: &RouteTable) -> String {
        match &self.prefix {
            Some(prefix) => prefix.clone(),
            None => format!(
                "/{}/{}",
                table.config().api_prefix,
                pluralize(&E::entity_name().to_lowercase())
            ),
        }
    }

    pub fn register<R>(&self, table: &mut RouteTable, repo: Arc<R>) -> Result<()>
    where
        R: Repository<E>,
    {
        let collection = PathPattern::parse(&self.prefix(table))?;
        let item = format!("{}/:id", collection.as_str().trim_end_matches('/'));

        let list = {
            let repo = Arc::clone(&repo);
            Handler::new(move |_| to_payload(&repo.find_all()?))
        };

        let fetch = {
            let repo = Arc::clone(&repo);
            Handler::new(move |ctx| {
                let id = id_param(ctx)?;
                match repo.find_by_id(id)? {
                    Some(found) => to_payload(&found),
                    None => Err(not_found::<E>(id)),
                }
            })
        };

        let create = {
            let repo = Arc::clone(&repo);
            Handler::new(move |ctx| {
                let body = ctx
                    .body
                    .clone()
                    .ok_or_else(|| HandlerError::BadRequest("request body required".into()))?;
                let item: E = serde_json::from_value(body)
                    .map_err(|err| HandlerError::BadRequest(err.to_string()))?;
                to_payload(&repo.save(item)?)
            })
        };

        let delete = Handler::new(move |ctx| {
            let id = id_param(ctx)?;
            match repo.delete(id)? {
                Some(_) => Ok(serde_json::json!({ "deleted": id })),
                None => Err(not_found::<E>(id)),
            }
        });

        table
            .register_api(Method::GET, collection.as_str(), list, RouteOptions::default())?
            .register_api(Method::GET, &item, fetch, RouteOptions::default())?
            .register_api(Method::POST, collection.as_str(), create, RouteOptions::default())?
            .register_api(Method::DELETE, &item, delete, RouteOptions::default())?;

        info!("CRUD API generated at {}", collection);
        Ok(())
    }
}

impl<E: Entity> Default for CrudGenerator<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable {
    /// CRUD routes for `E` under the default prefix
    pub fn crud<E, R>(&mut self, repo: Arc<R>) -> Result<&mut Self>
    where
        E: Entity,
        R: Repository<E>,
    {
        CrudGenerator::<E>::new().register(self, repo)?;
        Ok(self)
    }
}

fn id_param(ctx: &RequestContext) -> std::result::Result<&str, HandlerError> {
    ctx.param("id")
        .ok_or_else(|| HandlerError::BadRequest("missing `id` parameter".into()))
}

fn not_found<E: Entity>(id: &str) -> HandlerError {
    HandlerError::NotFound(format!("{} {}", E::entity_name(), id))
}

fn to_payload<T: Serialize>(value: &T) -> HandlerResult {
    Ok(serde_json::to_value(value).map_err(anyhow::Error::from)?)
}

/// English plural of a lower-case noun, covering the regular cases
pub fn pluralize(word: &str) -> String {
    if word.ends_with('s')
        || word.ends_with('x')
        || word.ends_with('z')
        || word.ends_with("ch")
        || word.ends_with("sh")
    {
        return format!("{}es", word);
    }
    if let Some(stem) = word.strip_suffix('y') {
        if !stem.is_empty() && !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{}ies", stem);
        }
    }
    format!("{}s", word)
}
