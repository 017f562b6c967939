use crate::identity::ClientId;
use crate::query::Query;
use indexmap::IndexMap;
use std::fmt;

/// Measurement protocol parameters for a single pageview hit.
///
/// Keys keep insertion order. Query parameters may replace any key, including
/// the protocol version and tracking ID; the collector is trusted to reject
/// whatever it does not understand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    params: IndexMap<String, Vec<String>>,
}

impl Payload {
    pub fn pageview(tracking_id: &str, cid: &ClientId, page: &str, ip: &str) -> Self {
        let params = [
            ("v", "1"),
            ("t", "pageview"),
            ("tid", tracking_id),
            ("cid", cid.as_str()),
            ("dp", page),
            ("uip", ip),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), vec![value.to_string()]))
        .collect();

        Payload { params }
    }

    /// Copies every query parameter over the payload, replacing all values of
    /// a key that is already present.
    pub fn overlay(&mut self, query: &Query) {
        for (key, values) in query.iter() {
            self.params.insert(key.to_string(), values.to_vec());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    #[cfg(test)]
    pub fn get_all(&self, key: &str) -> Option<&[String]> {
        self.params.get(key).map(Vec::as_slice)
    }

    /// `application/x-www-form-urlencoded` body, one pair per value.
    pub fn encode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.params {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}
