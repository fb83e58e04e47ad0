//! Officer neighbourhood traversal and the one-shot query pipeline

use crate::client::Client;
use crate::config::LookupConfig;
use crate::error::{ClientError, ClientResult};
use crate::record::Record;
use crate::statement::Statement;
use tracing::{debug, warn};

/// Relationship types followed from the officer
pub const RELATIONSHIP_TYPES: &str = "OFFICER_OF|INTERMEDIARY_OF|REGISTERED_ADDRESS";

/// Upper bound on traversal depth
pub const MAX_HOPS: u32 = 10;

/// Column holding each connected entity's name
pub const NAME_COLUMN: &str = "name";

/// Distinct names of entities within `max_hops` of a named officer
#[derive(Debug, Clone, PartialEq)]
pub struct OfficerLookup {
    pub name: String,
    pub max_hops: u32,
    pub limit: i64,
}

impl From<&LookupConfig> for OfficerLookup {
    fn from(config: &LookupConfig) -> Self {
        Self {
            name: config.name.clone(),
            max_hops: config.max_hops,
            limit: config.limit,
        }
    }
}

impl Default for OfficerLookup {
    fn default() -> Self {
        Self::from(&LookupConfig::default())
    }
}

impl OfficerLookup {
    pub fn validate(&self) -> ClientResult<()> {
        if self.name.trim().is_empty() {
            return Err(ClientError::config("officer name must not be empty"));
        }
        if !(1..=MAX_HOPS).contains(&self.max_hops) {
            return Err(ClientError::config(format!(
                "max_hops must be between 1 and {}, got {}",
                MAX_HOPS, self.max_hops
            )));
        }
        if self.limit <= 0 {
            return Err(ClientError::config(format!(
                "limit must be positive, got {}",
                self.limit
            )));
        }
        Ok(())
    }

    /// Build the traversal. Variable-length bounds cannot be parameters in
    /// Cypher, so the validated hop count is written into the text.
    pub fn statement(&self) -> ClientResult<Statement> {
        self.validate()?;
        let text = format!(
            "MATCH (a:Officer {{name: $name}})-[r:{rels}*..{hops}]-(b)\n\
             RETURN DISTINCT b.name AS {col} LIMIT $limit",
            rels = RELATIONSHIP_TYPES,
            hops = self.max_hops,
            col = NAME_COLUMN,
        );
        Ok(Statement::new(text)
            .param("name", self.name.as_str())
            .param("limit", self.limit)
            .returns([NAME_COLUMN]))
    }
}

/// Run one statement against `database`, then close the client.
///
/// The client is released exactly once whatever the outcome; the first
/// error wins.
pub async fn run_query(
    client: Client,
    database: &str,
    statement: &Statement,
) -> ClientResult<Vec<Record>> {
    let outcome = match statement.validate() {
        Ok(()) => client.execute_on(database, statement).await,
        Err(err) => Err(err),
    };
    let closed = client.close().await;

    match (outcome, closed) {
        (Ok(records), Ok(())) => {
            debug!(rows = records.len(), "Query pipeline finished");
            Ok(records)
        }
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!(error = %close_err, "Client close failed after query error");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::ParamValue;

    #[test]
    fn test_default_statement_matches_reference_query() {
        let stmt = OfficerLookup::default().statement().unwrap();
        assert_eq!(
            stmt.text(),
            "MATCH (a:Officer {name: $name})-[r:OFFICER_OF|INTERMEDIARY_OF|REGISTERED_ADDRESS*..5]-(b)\n\
             RETURN DISTINCT b.name AS name LIMIT $limit"
        );
        assert_eq!(
            stmt.get_param("name"),
            Some(&ParamValue::String("Stuart Onslow-Smith".into()))
        );
        assert_eq!(stmt.get_param("limit"), Some(&ParamValue::Integer(20)));
        assert_eq!(stmt.columns(), ["name".to_string()]);
        assert!(stmt.validate().is_ok());
    }

    #[test]
    fn test_hop_bounds() {
        let mut lookup = OfficerLookup::default();
        lookup.max_hops = 0;
        assert!(lookup.statement().is_err());
        lookup.max_hops = MAX_HOPS + 1;
        assert!(lookup.statement().is_err());
        lookup.max_hops = MAX_HOPS;
        assert!(lookup.statement().unwrap().text().contains("*..10]"));
    }

    #[test]
    fn test_rejects_blank_name_and_bad_limit() {
        let lookup = OfficerLookup {
            name: "   ".into(),
            ..OfficerLookup::default()
        };
        assert!(lookup.validate().is_err());

        let lookup = OfficerLookup {
            limit: 0,
            ..OfficerLookup::default()
        };
        assert!(lookup.validate().is_err());
    }

    #[test]
    fn test_name_is_bound_not_interpolated() {
        let lookup = OfficerLookup {
            name: "x'}) DETACH DELETE (a) //".into(),
            ..OfficerLookup::default()
        };
        let stmt = lookup.statement().unwrap();
        assert!(!stmt.text().contains("DETACH"));
        assert_eq!(stmt.placeholders(), vec!["name", "limit"]);
    }
}
