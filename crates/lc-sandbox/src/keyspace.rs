use std::collections::{BTreeMap, HashMap};

use lc_core::{LuaCallError, StoreValue};

/// String and hash data reachable from `redis.call` and from the client side.
#[derive(Debug, Default)]
pub(crate) struct Keyspace {
    strings: HashMap<String, String>,
    hashes: HashMap<String, BTreeMap<String, String>>,
}

impl Keyspace {
    pub(crate) fn dispatch(&mut self, argv: &[String]) -> Result<StoreValue, LuaCallError> {
        let Some((name, args)) = argv.split_first() else {
            return Err(LuaCallError::new(
                "ERR",
                "Please specify at least one argument for this redis lib call",
            ));
        };

        match name.to_ascii_uppercase().as_str() {
            "GET" => {
                let [key] = expect_args::<1>(name, args)?;
                self.ensure_not_hash(key)?;
                Ok(self
                    .strings
                    .get(key)
                    .cloned()
                    .map(StoreValue::Bulk)
                    .unwrap_or(StoreValue::Nil))
            }
            "SET" => {
                let [key, value] = expect_args::<2>(name, args)?;
                self.hashes.remove(key);
                self.strings.insert(key.clone(), value.clone());
                Ok(StoreValue::status("OK"))
            }
            "DEL" => {
                if args.is_empty() {
                    return Err(arity_error(name));
                }
                let removed = args
                    .iter()
                    .filter(|key| {
                        self.strings.remove(*key).is_some() || self.hashes.remove(*key).is_some()
                    })
                    .count();
                Ok(StoreValue::Integer(removed as i64))
            }
            "HGET" => {
                let [key, field] = expect_args::<2>(name, args)?;
                self.ensure_not_string(key)?;
                Ok(self
                    .hget(key, field)
                    .map(StoreValue::bulk)
                    .unwrap_or(StoreValue::Nil))
            }
            "HSET" => {
                if args.len() < 3 || args.len() % 2 == 0 {
                    return Err(arity_error(name));
                }
                let key = &args[0];
                self.ensure_not_string(key)?;
                let hash = self.hashes.entry(key.clone()).or_default();
                let mut added = 0;
                for pair in args[1..].chunks(2) {
                    if hash.insert(pair[0].clone(), pair[1].clone()).is_none() {
                        added += 1;
                    }
                }
                Ok(StoreValue::Integer(added))
            }
            "HGETALL" => {
                let [key] = expect_args::<1>(name, args)?;
                self.ensure_not_string(key)?;
                let flat = self
                    .hashes
                    .get(key)
                    .into_iter()
                    .flatten()
                    .flat_map(|(field, value)| {
                        [StoreValue::bulk(field.as_str()), StoreValue::bulk(value.as_str())]
                    })
                    .collect();
                Ok(StoreValue::Array(flat))
            }
            _ => Err(LuaCallError::new(
                "ERR",
                format!("Unknown Redis command called from script: {}", name),
            )),
        }
    }

    pub(crate) fn hget(&self, key: &str, field: &str) -> Option<&str> {
        self.hashes
            .get(key)
            .and_then(|hash| hash.get(field))
            .map(String::as_str)
    }

    fn ensure_not_hash(&self, key: &str) -> Result<(), LuaCallError> {
        if self.hashes.contains_key(key) {
            return Err(wrong_type());
        }
        Ok(())
    }

    fn ensure_not_string(&self, key: &str) -> Result<(), LuaCallError> {
        if self.strings.contains_key(key) {
            return Err(wrong_type());
        }
        Ok(())
    }
}

fn expect_args<'a, const N: usize>(
    name: &str,
    args: &'a [String],
) -> Result<[&'a String; N], LuaCallError> {
    if args.len() != N {
        return Err(arity_error(name));
    }
    let mut out = [&args[0]; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg;
    }
    Ok(out)
}

fn arity_error(name: &str) -> LuaCallError {
    LuaCallError::new(
        "ERR",
        format!(
            "wrong number of arguments for '{}' command",
            name.to_ascii_lowercase()
        ),
    )
}

fn wrong_type() -> LuaCallError {
    LuaCallError::new(
        "WRONGTYPE",
        "Operation against a key holding the wrong kind of value",
    )
}

#[cfg(test)]
mod keyspace_tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| part.to_string()).collect()
    }

    #[test]
    fn strings_round_trip_through_commands() {
        let mut keyspace = Keyspace::default();
        assert_eq!(
            keyspace.dispatch(&argv(&["SET", "k", "v"])).expect("set"),
            StoreValue::status("OK")
        );
        assert_eq!(
            keyspace.dispatch(&argv(&["get", "k"])).expect("get"),
            StoreValue::bulk("v")
        );
        assert_eq!(
            keyspace.dispatch(&argv(&["DEL", "k", "missing"])).expect("del"),
            StoreValue::Integer(1)
        );
        assert_eq!(
            keyspace.dispatch(&argv(&["GET", "k"])).expect("get"),
            StoreValue::Nil
        );
    }

    #[test]
    fn hashes_track_new_fields() {
        let mut keyspace = Keyspace::default();
        assert_eq!(
            keyspace
                .dispatch(&argv(&["HSET", "h", "a", "1", "b", "2"]))
                .expect("hset"),
            StoreValue::Integer(2)
        );
        assert_eq!(
            keyspace.dispatch(&argv(&["HSET", "h", "a", "3"])).expect("hset"),
            StoreValue::Integer(0)
        );
        assert_eq!(keyspace.hget("h", "a"), Some("3"));
        assert_eq!(
            keyspace.dispatch(&argv(&["HGETALL", "h"])).expect("hgetall"),
            StoreValue::Array(vec![
                StoreValue::bulk("a"),
                StoreValue::bulk("3"),
                StoreValue::bulk("b"),
                StoreValue::bulk("2"),
            ])
        );
        assert_eq!(
            keyspace.dispatch(&argv(&["HGET", "h", "zz"])).expect("hget"),
            StoreValue::Nil
        );
    }

    #[test]
    fn type_and_arity_errors() {
        let mut keyspace = Keyspace::default();
        keyspace.dispatch(&argv(&["SET", "s", "v"])).expect("set");
        assert_eq!(
            keyspace
                .dispatch(&argv(&["HGET", "s", "f"]))
                .expect_err("wrong type")
                .code,
            "WRONGTYPE"
        );
        assert_eq!(
            keyspace
                .dispatch(&argv(&["HSET", "h", "f"]))
                .expect_err("arity")
                .message,
            "wrong number of arguments for 'hset' command"
        );
        assert!(keyspace.dispatch(&argv(&["FLUSHALL"])).is_err());
        assert!(keyspace.dispatch(&[]).is_err());
    }
}
