//! store/notion: DocumentStore поверх Notion REST API (reqwest blocking).
//!
//! Эндпоинты:
//!   POST  {base}/search                   - список страниц (filter object=page,
//!                                           sort last_edited_time asc) и поиск по заголовку
//!   GET   {base}/blocks/{id}/children     - дочерние блоки страницы/блока
//!   PATCH {base}/blocks/{id}              - { "<type>": { "rich_text": [...], "color": ... } }
//!
//! Заголовки: Authorization: Bearer <NOTION_KEY>, Notion-Version: <version>.
//!
//! Разрешение упоминаний:
//! - RefTarget::Category(name) превращается в page mention по результату /search;
//! - сравнение заголовков без учёта регистра, U+2019 нормализуется в `'`;
//! - результат (в т.ч. отрицательный) кэшируется на время процесса;
//! - не нашли: OnMissing::Abort -> StoreError::Unresolved,
//!             OnMissing::Keep  -> resolve_category отдаёт None, спан остаётся в исходном
//!                                 тексте как есть; блок без других спанов не пишется.
//! - update_block с неразрешимой Category всегда даёт StoreError::Unresolved.
//!
//! Любой не-2xx ответ даёт StoreError::Status; ретраев нет.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Map, Value};

use crate::config::{MigrateConfig, OnMissing};
use crate::error::{StoreError, StoreResult};
use crate::metrics::{
    record_api_call, record_api_error, record_mention_cache_hit, record_mention_unresolved,
    ApiCall,
};
use crate::richtext::{Annotations, Block, BlockBody, BlockKind, RefTarget, Reference, Run, TextRun};

use super::throttle::Throttle;
use super::{DocumentStore, Listing, PageRef};

const REQUEST_TIMEOUT_SECS: u64 = 60;

pub struct NotionStore {
    client: Client,
    base: String,
    page_size: u32,
    on_missing: OnMissing,
    throttle: Throttle,
    // normalized title -> page id (None = no such page)
    mention_cache: HashMap<String, Option<String>>,
}

impl NotionStore {
    pub fn new(cfg: &MigrateConfig) -> Result<Self> {
        let key = cfg.require_api_key()?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", key))
            .context("NOTION_KEY contains characters not allowed in a header")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            "Notion-Version",
            HeaderValue::from_str(&cfg.notion_version).context("invalid NOTION_VERSION")?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            client,
            base: cfg.api_base.trim_end_matches('/').to_string(),
            page_size: cfg.page_size,
            on_missing: cfg.on_missing,
            throttle: Throttle::from_millis(cfg.request_interval_ms),
            mention_cache: HashMap::new(),
        })
    }

    fn send(&mut self, op: &str, call: ApiCall, req: RequestBuilder) -> StoreResult<Value> {
        self.throttle.wait();
        record_api_call(call);
        debug!("notion: {}", op);

        let res = req.send();
        self.throttle.mark();

        let resp = res.map_err(|source| {
            record_api_error();
            StoreError::Transport {
                op: op.to_string(),
                source,
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            record_api_error();
            let body = resp.text().unwrap_or_default();
            return Err(StoreError::Status {
                op: op.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<Value>()
            .map_err(|e| StoreError::decode(op, e.to_string()))
    }

    fn search(&mut self, query: Option<&str>, cursor: Option<&str>) -> StoreResult<Value> {
        let mut body = json!({
            "filter": { "value": "page", "property": "object" },
            "sort": { "direction": "ascending", "timestamp": "last_edited_time" },
            "page_size": self.page_size,
        });
        if let Some(q) = query {
            body["query"] = Value::String(q.to_string());
        }
        if let Some(c) = cursor {
            body["start_cursor"] = Value::String(c.to_string());
        }
        let req = self.client.post(format!("{}/search", self.base)).json(&body);
        let call = if query.is_some() {
            ApiCall::Search
        } else {
            ApiCall::ListPages
        };
        self.send("search", call, req)
    }

    /// Page id whose title equals `name` (case-insensitive, apostrophes normalized).
    pub fn resolve_page(&mut self, name: &str) -> StoreResult<Option<String>> {
        let wanted = normalize_title(name);
        if let Some(hit) = self.mention_cache.get(&wanted) {
            record_mention_cache_hit();
            return Ok(hit.clone());
        }

        let mut cursor: Option<String> = None;
        let mut found = None;
        loop {
            let resp = self.search(Some(&wanted), cursor.as_deref())?;
            let (results, next, has_more) = split_listing("search", &resp)?;
            for r in results {
                let title = page_title(r).map(|t| normalize_title(&t));
                if title.as_deref() == Some(wanted.as_str()) {
                    found = r.get("id").and_then(Value::as_str).map(str::to_string);
                    break;
                }
            }
            if found.is_some() || !has_more || next.is_none() {
                break;
            }
            cursor = next;
        }

        if found.is_none() {
            record_mention_unresolved();
        }
        self.mention_cache.insert(wanted, found.clone());
        Ok(found)
    }

    fn render_run(&mut self, run: &Run) -> StoreResult<Value> {
        match run {
            Run::Text(t) => Ok(text_json(t)),
            Run::Other(v) => Ok(v.clone()),
            Run::Reference(r) => {
                let mention = match &r.target {
                    RefTarget::Page { id } => json!({ "type": "page", "page": { "id": id } }),
                    RefTarget::Raw(m) => m.clone(),
                    RefTarget::Category(name) => match self.resolve_page(name)? {
                        Some(id) => json!({ "type": "page", "page": { "id": id } }),
                        None => return Err(StoreError::Unresolved(name.clone())),
                    },
                };
                Ok(json!({
                    "type": "mention",
                    "mention": mention,
                    "annotations": r.annotations,
                }))
            }
        }
    }
}

impl DocumentStore for NotionStore {
    fn list_pages(&mut self, cursor: Option<&str>) -> StoreResult<Listing<PageRef>> {
        let resp = self.search(None, cursor)?;
        let (results, next_cursor, has_more) = split_listing("search", &resp)?;
        let mut items = Vec::with_capacity(results.len());
        for r in results {
            let id = r
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| StoreError::decode("search", "result without id"))?;
            items.push(PageRef {
                id: id.to_string(),
                title: page_title(r),
            });
        }
        Ok(Listing {
            items,
            next_cursor,
            has_more,
        })
    }

    fn list_children(
        &mut self,
        parent_id: &str,
        cursor: Option<&str>,
    ) -> StoreResult<Listing<Block>> {
        let mut req = self
            .client
            .get(format!("{}/blocks/{}/children", self.base, parent_id))
            .query(&[("page_size", self.page_size.to_string())]);
        if let Some(c) = cursor {
            req = req.query(&[("start_cursor", c)]);
        }
        let resp = self.send("list_children", ApiCall::ListChildren, req)?;
        let (results, next_cursor, has_more) = split_listing("list_children", &resp)?;
        let items = results
            .iter()
            .map(parse_block)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Listing {
            items,
            next_cursor,
            has_more,
        })
    }

    fn resolve_category(&mut self, category: &str) -> StoreResult<Option<RefTarget>> {
        match self.resolve_page(category)? {
            Some(id) => {
                info!("mention [[{}]] -> page {}", category, id);
                Ok(Some(RefTarget::Page { id }))
            }
            None => match self.on_missing {
                OnMissing::Abort => Err(StoreError::Unresolved(category.to_string())),
                OnMissing::Keep => {
                    warn!("no page named '{}', leaving [[{}]] as text", category, category);
                    Ok(None)
                }
            },
        }
    }

    fn update_block(&mut self, block: &Block, runs: &[Run]) -> StoreResult<()> {
        let mut rich_text = Vec::with_capacity(runs.len());
        for r in runs {
            rich_text.push(self.render_run(r)?);
        }

        let mut content = Map::new();
        content.insert("rich_text".into(), Value::Array(rich_text));
        if let BlockBody::Text {
            color: Some(color), ..
        } = &block.body
        {
            content.insert("color".into(), Value::String(color.clone()));
        }
        let mut body = Map::new();
        body.insert(block.kind.type_name().to_string(), Value::Object(content));

        let req = self
            .client
            .patch(format!("{}/blocks/{}", self.base, block.id))
            .json(&Value::Object(body));
        self.send("update_block", ApiCall::Update, req)?;
        Ok(())
    }
}

// ---------------- JSON mapping ----------------

/// Lowercase and replace the right single quotation mark with an ASCII apostrophe.
pub fn normalize_title(s: &str) -> String {
    s.replace('\u{2019}', "'").to_lowercase()
}

fn split_listing<'a>(
    op: &str,
    resp: &'a Value,
) -> StoreResult<(&'a Vec<Value>, Option<String>, bool)> {
    let results = resp
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::decode(op, "missing 'results' array"))?;
    let next = resp
        .get("next_cursor")
        .and_then(Value::as_str)
        .map(str::to_string);
    let has_more = resp.get("has_more").and_then(Value::as_bool).unwrap_or(false);
    Ok((results, next, has_more))
}

/// Title of a page object: the property of type "title", all fragments joined.
pub fn page_title(page: &Value) -> Option<String> {
    let props = page.get("properties")?.as_object()?;
    let title = props
        .values()
        .find(|p| p.get("type").and_then(Value::as_str) == Some("title"))?;
    let parts = title.get("title")?.as_array()?;
    let joined: String = parts
        .iter()
        .filter_map(|p| p.get("plain_text").and_then(Value::as_str))
        .collect();
    Some(joined)
}

/// Parse one block object from a children listing.
pub fn parse_block(v: &Value) -> StoreResult<Block> {
    let id = v
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::decode("list_children", "block without id"))?;
    let type_name = v
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::decode("list_children", format!("block {} without type", id)))?;
    let kind = BlockKind::from_type_name(type_name);
    let has_children = v.get("has_children").and_then(Value::as_bool).unwrap_or(false);

    let body = if kind.is_textual() {
        match parse_text_body(v.get(type_name)) {
            Ok((runs, color)) => BlockBody::Text { runs, color },
            Err(reason) => BlockBody::Malformed(reason),
        }
    } else {
        BlockBody::Unsupported
    };

    Ok(Block {
        id: id.to_string(),
        kind,
        body,
        has_children,
    })
}

fn parse_text_body(content: Option<&Value>) -> Result<(Vec<Run>, Option<String>), String> {
    let content = content.ok_or("missing type payload")?;
    let items = content
        .get("rich_text")
        .and_then(Value::as_array)
        .ok_or("missing rich_text array")?;
    let runs = items
        .iter()
        .enumerate()
        .map(|(i, r)| parse_run(r).map_err(|e| format!("run #{}: {}", i, e)))
        .collect::<Result<Vec<_>, _>>()?;
    let color = content
        .get("color")
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok((runs, color))
}

/// Parse one rich-text object.
pub fn parse_run(v: &Value) -> Result<Run, String> {
    let annotations = match v.get("annotations") {
        Some(a) => serde_json::from_value::<Annotations>(a.clone())
            .map_err(|e| format!("annotations: {}", e))?,
        None => Annotations::default(),
    };
    match v.get("type").and_then(Value::as_str) {
        Some("text") => {
            let text = v.get("text").ok_or("text run without 'text'")?;
            let content = text
                .get("content")
                .and_then(Value::as_str)
                .ok_or("text run without content")?;
            let link = text
                .get("link")
                .and_then(|l| l.get("url"))
                .and_then(Value::as_str)
                .map(str::to_string);
            Ok(Run::Text(TextRun {
                content: content.to_string(),
                link,
                annotations,
            }))
        }
        Some("mention") => {
            let mention = v.get("mention").ok_or("mention run without 'mention'")?;
            let target = match mention.get("type").and_then(Value::as_str) {
                Some("page") => {
                    let id = mention
                        .get("page")
                        .and_then(|p| p.get("id"))
                        .and_then(Value::as_str)
                        .ok_or("page mention without id")?;
                    RefTarget::Page { id: id.to_string() }
                }
                _ => RefTarget::Raw(mention.clone()),
            };
            let plain_text = v
                .get("plain_text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Ok(Run::Reference(Reference {
                target,
                plain_text,
                annotations,
            }))
        }
        Some(_) => Ok(Run::Other(v.clone())),
        None => Err("run without type".to_string()),
    }
}

fn text_json(t: &TextRun) -> Value {
    json!({
        "type": "text",
        "text": {
            "content": t.content,
            "link": t.link.as_ref().map(|u| json!({ "url": u })),
        },
        "annotations": t.annotations,
    })
}
