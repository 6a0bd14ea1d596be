// Library root
// -----------
// The `cx` binary is a thin wrapper around these modules so the request
// pipeline can be exercised from tests without spawning a process.
//
// Module responsibilities:
// - `config`: reads and validates `~/.cxrc` (credentials, API server,
//   timeout).
// - `request`: resolves the target URL, picks GET/POST and reads the body.
// - `auth`: fetches the server date and computes the HMAC signature.
// - `api`: sends the signed request and reads the response.
// - `ui`: prints the response and shows progress on stderr.
// - `app`: runs the stages in order; `cli` and `error` cover argument
//   parsing and exit codes.
pub mod api;
pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod request;
pub mod ui;
