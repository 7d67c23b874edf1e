//! The translator configuration file.
//!
//! Line-oriented plain text with three directive kinds (keywords are
//! case-insensitive, `#` starts a comment):
//!
//! ```text
//! PACKAGE icecube.daq.payload -> payload
//! INTERFACE ILoadablePayload
//! RECEIVER icecube.daq.payload.PayloadReader -> rdr
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use rustc_hash::FxHashMap;
use tracing::warn;

const TYPE_INTERFACE: &str = "INTERFACE";
const TYPE_PACKAGE: &str = "PACKAGE";
const TYPE_RECEIVER: &str = "RECEIVER";

/// Parsed configuration: package mapping, interface list, receiver names.
#[derive(Debug, Default)]
pub struct Config {
    interfaces: FxHashMap<String, String>,
    packages: FxHashMap<String, String>,
    receivers: FxHashMap<String, String>,
}

fn add_entry(map: &mut FxHashMap<String, String>, type_name: &str, key: &str, val: &str) {
    if let Some(old) = map.get(key) {
        warn!(
            "Overwriting {} entry {} value {} with {}",
            type_name, key, old, val
        );
    }
    map.insert(key.to_string(), val.to_string());
}

impl Config {
    /// Read a configuration file. A missing or unreadable file is a
    /// warning, not an error: the result is an empty configuration.
    pub fn from_path(path: &Path) -> Config {
        match File::open(path) {
            Ok(fd) => Config::from_reader(BufReader::new(fd)),
            Err(err) => {
                warn!("Cannot open config file {}: {}", path.display(), err);
                Config::default()
            }
        }
    }

    pub fn from_reader(reader: impl Read) -> Config {
        let mut cfg = Config::default();

        for line in BufReader::new(reader).lines() {
            let line = match line {
                Ok(l) => l,
                Err(err) => {
                    warn!("Error reading config: {}", err);
                    break;
                }
            };

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() || fields[0].starts_with('#') {
                continue;
            }

            match fields[0].to_uppercase().as_str() {
                TYPE_INTERFACE => {
                    if fields.len() != 2 {
                        warn!("Bad config line: {}", line);
                    } else {
                        cfg.add_interface(fields[1]);
                    }
                }
                TYPE_PACKAGE => {
                    if fields.len() != 4 || fields[2] != "->" {
                        warn!("Bad config line: {}", line);
                    } else {
                        cfg.add_package(fields[1], fields[3]);
                    }
                }
                TYPE_RECEIVER => {
                    if fields.len() != 4 || fields[2] != "->" {
                        warn!("Bad config line: {}", line);
                    } else {
                        cfg.add_receiver(fields[1], fields[3]);
                    }
                }
                _ => warn!("Unknown config directive: {}", line),
            }
        }

        cfg
    }

    pub fn add_interface(&mut self, name: &str) {
        add_entry(&mut self.interfaces, TYPE_INTERFACE, name, name);
    }

    pub fn add_package(&mut self, name: &str, value: &str) {
        add_entry(&mut self.packages, TYPE_PACKAGE, name, value);
    }

    pub fn add_receiver(&mut self, name: &str, value: &str) {
        add_entry(&mut self.receivers, TYPE_RECEIVER, name, value);
    }

    pub fn is_interface(&self, name: &str) -> bool {
        self.interfaces.contains_key(name)
    }

    /// Map a Java package path through the `PACKAGE` entries. The longest
    /// matching prefix wins; whatever follows the prefix is carried over
    /// unchanged. Returns `None` when no entry matches.
    pub fn find_package(&self, path: &str) -> Option<String> {
        let mut best_key = "";
        let mut best_val = "";
        for (k, v) in &self.packages {
            if path.starts_with(k.as_str()) && k.len() > best_key.len() {
                best_key = k;
                best_val = v;
            }
        }

        if best_key.is_empty() {
            return None;
        }

        Some(format!("{}{}", best_val, &path[best_key.len()..]))
    }

    /// The configured receiver name for a (package-qualified) class, if any.
    pub fn receiver(&self, key: &str) -> Option<&str> {
        self.receivers.get(key).map(String::as_str)
    }

    fn sorted_keys(map: &FxHashMap<String, String>) -> Vec<&String> {
        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort();
        keys
    }

    /// Re-emit the configuration in canonical sorted form.
    pub fn dump(&self, out: &mut dyn Write) -> io::Result<()> {
        let mut need_nl = false;

        if !self.packages.is_empty() {
            writeln!(out, "# map Java packages to Go packages")?;
            for k in Config::sorted_keys(&self.packages) {
                writeln!(out, "{} {} -> {}", TYPE_PACKAGE, k, self.packages[k])?;
            }
            need_nl = true;
        }

        if !self.interfaces.is_empty() {
            if need_nl {
                writeln!(out)?;
            }
            writeln!(
                out,
                "# names which should be treated as interfaces rather than structs"
            )?;
            for k in Config::sorted_keys(&self.interfaces) {
                writeln!(out, "{} {}", TYPE_INTERFACE, k)?;
            }
            need_nl = true;
        }

        if !self.receivers.is_empty() {
            if need_nl {
                writeln!(out)?;
            }
            writeln!(out, "# receiver name to use (other than 'rcvr')")?;
            for k in Config::sorted_keys(&self.receivers) {
                writeln!(out, "{} {} -> {}", TYPE_RECEIVER, k, self.receivers[k])?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Config {
        Config::from_reader(text.as_bytes())
    }

    #[test]
    fn directives() {
        let cfg = parse(
            "# a comment\n\
             \n\
             PACKAGE icecube.daq -> daq\n\
             interface Payload\n\
             Receiver foo.Bar -> b\n",
        );

        assert!(cfg.is_interface("Payload"));
        assert_eq!(cfg.find_package("icecube.daq").as_deref(), Some("daq"));
        assert_eq!(cfg.receiver("foo.Bar"), Some("b"));
    }

    #[test]
    fn longest_prefix_with_remainder() {
        let cfg = parse(
            "PACKAGE a.b -> x\n\
             PACKAGE a.b.c -> y\n",
        );

        assert_eq!(cfg.find_package("a.b.c.d").as_deref(), Some("y.d"));
        assert_eq!(cfg.find_package("a.b.z").as_deref(), Some("x.z"));
        assert_eq!(cfg.find_package("q.r"), None);
    }

    #[test]
    fn bad_lines_are_skipped() {
        let cfg = parse(
            "PACKAGE too few\n\
             RECEIVER a.B x y\n\
             INTERFACE Ok\n",
        );

        assert!(cfg.is_interface("Ok"));
        assert_eq!(cfg.find_package("too"), None);
        assert_eq!(cfg.receiver("a.B"), None);
    }

    #[test]
    fn dump_round_trip() {
        let cfg = parse(
            "PACKAGE a.b -> x\n\
             INTERFACE I\n\
             RECEIVER a.b.C -> c\n",
        );

        let mut buf = Vec::new();
        cfg.dump(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let reparsed = parse(&text);
        assert!(reparsed.is_interface("I"));
        assert_eq!(reparsed.find_package("a.b").as_deref(), Some("x"));
        assert_eq!(reparsed.receiver("a.b.C"), Some("c"));
    }
}
