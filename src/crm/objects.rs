//! Payloads for the v3 object endpoints (contacts, companies, deals)

use crate::Result;
use crate::constants::{ASSOC_CATEGORY_HUBSPOT_DEFINED, ASSOC_DEAL_TO_COMPANY, ASSOC_DEAL_TO_CONTACT};
use crate::model::{CompanyInput, ContactInput, DealInput};
use serde_json::{Map, Value, json};

/// Insert `value` under `key` only when present
fn put(properties: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        properties.insert(key.to_string(), Value::String(value.to_string()));
    }
}

pub fn contact_payload(input: &ContactInput) -> Value {
    let mut properties = Map::new();
    put(&mut properties, "firstname", input.first_name.as_deref());
    put(&mut properties, "lastname", input.last_name.as_deref());
    put(&mut properties, "email", input.email.as_deref());
    put(&mut properties, "phone", input.phone.as_deref());
    json!({ "properties": properties })
}

pub fn company_payload(input: &CompanyInput) -> Value {
    let mut properties = Map::new();
    put(&mut properties, "name", input.name.as_deref());
    put(&mut properties, "domain", input.domain.as_deref());
    put(&mut properties, "phone", input.phone.as_deref());
    json!({ "properties": properties })
}

/// Deal properties plus v3 associations to the given contact and company
///
/// Fails on a non-numeric amount or an unparseable close date.
pub fn deal_payload(input: &DealInput) -> Result<Value> {
    let mut properties = Map::new();
    put(&mut properties, "dealname", Some(input.deal_name.trim()));
    if let Some(amount) = &input.amount {
        properties.insert("amount".to_string(), Value::String(amount.normalize()?));
    }
    put(&mut properties, "dealstage", input.deal_stage.as_deref());
    put(&mut properties, "pipeline", input.pipeline.as_deref());
    if let Some(close_date) = &input.close_date {
        properties.insert(
            "closedate".to_string(),
            Value::String(close_date.to_epoch_millis()?.to_string()),
        );
    }

    let mut associations = Vec::new();
    if let Some(contact_id) = &input.contact_id {
        associations.push(association(contact_id, ASSOC_DEAL_TO_CONTACT));
    }
    if let Some(company_id) = &input.company_id {
        associations.push(association(company_id, ASSOC_DEAL_TO_COMPANY));
    }

    let mut payload = Map::new();
    payload.insert("properties".to_string(), Value::Object(properties));
    if !associations.is_empty() {
        payload.insert("associations".to_string(), Value::Array(associations));
    }
    Ok(Value::Object(payload))
}

fn association(to_id: &str, type_id: u32) -> Value {
    json!({
        "to": { "id": to_id },
        "types": [{
            "associationCategory": ASSOC_CATEGORY_HUBSPOT_DEFINED,
            "associationTypeId": type_id
        }]
    })
}
