/*!
# Libretto Reference Service

Search service for a multilingual opera libretto reference site (Richard
Strauss, Richard Wagner, Gustav Mahler), built in Rust.

## Overview

The site's data lives in a spreadsheet workbook: one sheet of libretto lines
per composer, plus lookup sheets for scene names, score editions and several
reference lists. The service reads those sheets, filters and groups the rows
for a query, and answers with ready-to-insert HTML fragments (or plain JSON
data for pages that render themselves).

## Architecture

### Data Layer
- **Workbook sources**: a directory of `<sheet>.csv` files, an `.xlsx`
  workbook, or an in-memory workbook for tests
- **Sheets**: header lookup by lowercase name, libretto row extraction
- **Cache**: parsed rows and term lists kept for a limited time, stored as
  gzip-compressed bincode split into fixed-size chunks

### Query Layer
- Scene search, page search (with page ranges like `12-15, 20`), German term
  search and autocomplete suggestions
- Reference list pages sorted the German way and anchored per letter
- Diacritic-insensitive matching through a single normalization function

### Web Layer
- **Technologies**: axum, tokio, tower-http
- One `GET /exec` endpoint; the `action` parameter picks the handler
- A query client that drops responses overtaken by newer requests

## Modules

- **cell**: Cell values as read from a sheet
- **spreadsheet**: Sheets, header maps and libretto rows
- **loader**: Workbook sources (CSV directory, xlsx, memory)
- **codec** / **cache**: Compressed payloads and the chunked TTL cache
- **text**: Normalization and German collation
- **pages**: Page input parsing
- **html**: Escaping and result markup
- **composer**: Per-composer sheet names and display tables
- **store**: Cached access to the workbook
- **search**: Search handlers
- **lists**: Reference list data and pages
- **config**: Environment configuration
- **app**: Routing and action dispatch
- **client**: Remote access with stale-response discarding

## REST API Endpoints

- `/exec?action=searchRichardStraussByScene&opera=...&scenes=1-1,1-2`
- `/exec?action=searchRichardWagnerByPage&opera=...&pageInput=12-15`
- `/exec?action=searchRSTerms&query=...` (also `searchRWTerms`, `searchByTerm`)
- `/exec?action=searchRSTermsPartially&input=...` (also `RW`, `GM`)
- `/exec?action=getRSTermsForClient` (also `RW`, `GM`)
- `/exec?action=getSceneOptionsForOpera&composer=RS`
- `/exec?action=getListData` (also `getAbbrListData`, `getDicData`, `getNotesData`)
- `/exec?action=getListHtml` (also `getAbbrListHtml`, `getDicHtml`, `getNotesHtml`)
*/

pub mod cache;
pub mod cell;
pub mod codec;
pub mod composer;
pub mod config;
pub mod error;
pub mod html;
pub mod lists;
pub mod loader;
pub mod pages;
pub mod search;
pub mod spreadsheet;
pub mod store;
pub mod text;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod client;

pub use cache::ChunkedCache;
pub use cell::CellValue;
pub use composer::Composer;
pub use config::Config;
pub use error::{CacheError, ConfigError, DataError, LoadError};
pub use loader::{CsvDirSource, MemorySource, WorkbookSource, XlsxSource, open_source};
pub use spreadsheet::{LibrettoRow, Sheet};
pub use store::DataStore;
