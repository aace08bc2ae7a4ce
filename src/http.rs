//! Smart-HTTP v2 client: reference discovery (`info/refs`) and pack fetch
//! (`git-upload-pack`).

use std::collections::BTreeMap;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::error::{GitError, Result};
use crate::pktline::{self, PktLine};

const SERVICE: &str = "git-upload-pack";

/// Discovers the remote's refs via `GET {url}/info/refs?service=git-upload-pack`.
///
/// Ignores the service-announcement pkt-line (`# service=...`) and the
/// flush that follows it. For each subsequent data frame, splits on the
/// first NUL (capabilities trail the first ref) and then on the first space
/// into `(sha, name)`.
pub fn discover_refs(base_url: &str) -> Result<BTreeMap<String, String>> {
    let url = format!("{base_url}/info/refs?service={SERVICE}");
    let client = reqwest::blocking::Client::new();

    let response = client
        .get(&url)
        .send()
        .map_err(|e| GitError::ProtocolError(format!("GET {url} failed: {e}")))?;

    if response.status() != reqwest::StatusCode::OK {
        return Err(GitError::ProtocolError(format!(
            "GET {url} returned status {}",
            response.status()
        )));
    }

    let body = response
        .bytes()
        .map_err(|e| GitError::ProtocolError(format!("reading response body from {url}: {e}")))?;

    parse_ref_discovery(&body)
}

fn parse_ref_discovery(body: &Bytes) -> Result<BTreeMap<String, String>> {
    let frames = pktline::decode_all(body)?;
    let mut refs = BTreeMap::new();
    let mut past_announcement = false;

    for frame in frames {
        match frame {
            PktLine::Flush | PktLine::Delim => continue,
            PktLine::Data(data) => {
                if !past_announcement {
                    // The first frame is "# service=git-upload-pack\n"; skip it
                    // (and anything before the service line is actually hit).
                    if data.starts_with(b"#") {
                        past_announcement = true;
                        continue;
                    }
                    past_announcement = true;
                }

                let without_caps = match data.iter().position(|&b| b == 0) {
                    Some(nul) => &data[..nul],
                    None => &data[..],
                };
                let line = String::from_utf8_lossy(without_caps);
                let line = line.trim_end_matches('\n');

                let Some((sha, name)) = line.split_once(' ') else {
                    warn!(?line, "ignoring malformed ref-advertisement line");
                    continue;
                };
                refs.insert(name.to_string(), sha.to_string());
            }
        }
    }

    if refs.is_empty() {
        return Err(GitError::ProtocolError("ref discovery returned no refs".into()));
    }

    debug!(count = refs.len(), "discovered refs");
    Ok(refs)
}

/// Fetches a pack containing `wants` via `POST {url}/git-upload-pack`
/// (protocol v2), demultiplexing the side-band-64k response into raw pack
/// bytes. Channel 3 (error) text is surfaced as `RemoteError`.
pub fn fetch_pack(base_url: &str, wants: &[String]) -> Result<Vec<u8>> {
    let url = format!("{base_url}/{SERVICE}");
    let client = reqwest::blocking::Client::new();

    let mut body = Vec::new();
    body.extend(pktline::encode(b"command=fetch\n"));
    body.extend(pktline::delim());
    body.extend(pktline::encode(b"no-progress\n"));
    for want in wants {
        body.extend(pktline::encode(format!("want {want}\n").as_bytes()));
    }
    body.extend(pktline::encode(b"done\n"));
    body.extend(pktline::flush());

    let response = client
        .post(&url)
        .header("Git-Protocol", "version=2")
        .header("Content-Type", "application/x-git-upload-pack-request")
        .body(body)
        .send()
        .map_err(|e| GitError::ProtocolError(format!("POST {url} failed: {e}")))?;

    if response.status() != reqwest::StatusCode::OK {
        return Err(GitError::ProtocolError(format!(
            "POST {url} returned status {}",
            response.status()
        )));
    }

    let raw = response
        .bytes()
        .map_err(|e| GitError::ProtocolError(format!("reading response body from {url}: {e}")))?;

    demux_pack_response(&raw)
}

fn demux_pack_response(raw: &Bytes) -> Result<Vec<u8>> {
    let frames = pktline::decode_all(raw)?;
    let mut pack = Vec::new();
    let mut saw_data = false;

    for frame in frames {
        let data = match frame {
            PktLine::Flush | PktLine::Delim => continue,
            PktLine::Data(data) => data,
        };

        if !saw_data && (data == b"packfile\n" || data.starts_with(b"packfile")) {
            saw_data = true;
            continue;
        }
        saw_data = true;

        let Some((&channel, payload)) = data.split_first() else {
            continue;
        };

        match channel {
            1 => pack.extend_from_slice(payload),
            2 => debug!(progress = %String::from_utf8_lossy(payload), "remote progress"),
            3 => {
                return Err(GitError::RemoteError(
                    String::from_utf8_lossy(payload).trim_end().to_string(),
                ))
            }
            other => {
                return Err(GitError::ProtocolError(format!(
                    "unexpected sideband channel {other}"
                )))
            }
        }
    }

    Ok(pack)
}
