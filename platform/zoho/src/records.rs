use products_leads::{Lead, LeadFields};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One page of `GET /Leads`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LeadsPage {
    #[serde(default)]
    pub data: Vec<ZohoLead>,
    #[serde(default)]
    pub info: PageInfo,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PageInfo {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub more_records: bool,
}

/// A lead record exactly as the Leads endpoint returns it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ZohoLead {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(rename = "First_Name", default, deserialize_with = "lenient_string")]
    pub first_name: Option<String>,
    #[serde(rename = "Last_Name", default, deserialize_with = "lenient_string")]
    pub last_name: Option<String>,
    #[serde(rename = "Email", default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
    #[serde(rename = "Phone", default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(rename = "Company", default, deserialize_with = "lenient_string")]
    pub company: Option<String>,
    #[serde(rename = "Owner", default)]
    pub owner: Option<OwnerField>,
    #[serde(rename = "Lead_Status", default, deserialize_with = "lenient_string")]
    pub lead_status: Option<String>,
    #[serde(rename = "Lead_Source", default, deserialize_with = "lenient_string")]
    pub lead_source: Option<String>,
    #[serde(rename = "Created_Time", default, deserialize_with = "lenient_string")]
    pub created_time: Option<String>,
    #[serde(rename = "Rating", default, deserialize_with = "lenient_string")]
    pub rating: Option<String>,
    #[serde(rename = "Description", default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
}

/// The `Owner` lookup: normally a user reference, occasionally a bare name.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum OwnerField {
    User {
        #[serde(default, deserialize_with = "lenient_string")]
        name: Option<String>,
        #[serde(default, deserialize_with = "lenient_string")]
        id: Option<String>,
        #[serde(default, deserialize_with = "lenient_string")]
        email: Option<String>,
    },
    Name(String),
    Other(Value),
}

impl OwnerField {
    pub fn name(&self) -> Option<&str> {
        match self {
            OwnerField::User { name, .. } => name.as_deref(),
            OwnerField::Name(name) => Some(name),
            OwnerField::Other(_) => None,
        }
    }
}

/// Accepts strings, numbers and booleans; everything else reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

impl From<ZohoLead> for Lead {
    fn from(raw: ZohoLead) -> Self {
        let owner = raw
            .owner
            .as_ref()
            .and_then(OwnerField::name)
            .map(str::to_string);
        Lead::from_fields(LeadFields {
            id: raw.id,
            first_name: raw.first_name,
            last_name: raw.last_name,
            email: raw.email,
            phone: raw.phone,
            company: raw.company,
            owner,
            status: raw.lead_status,
            source: raw.lead_source,
            created_time: raw.created_time,
            rating: raw.rating,
            description: raw.description,
        })
    }
}
