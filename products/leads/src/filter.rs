use crate::model::Lead;

/// Multi-select filters. An empty selection lets every value through.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LeadFilter {
    pub owners: Vec<String>,
    pub statuses: Vec<String>,
    pub sources: Vec<String>,
}

impl LeadFilter {
    pub fn owners(mut self, owners: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.owners = owners.into_iter().map(Into::into).collect();
        self
    }

    pub fn statuses(mut self, statuses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.statuses = statuses.into_iter().map(Into::into).collect();
        self
    }

    pub fn sources(mut self, sources: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        selected(&self.owners, &lead.owner)
            && selected(&self.statuses, &lead.status)
            && selected(&self.sources, &lead.source)
    }

    pub fn apply<'a>(&self, leads: &[&'a Lead]) -> Vec<&'a Lead> {
        leads.iter().copied().filter(|lead| self.matches(lead)).collect()
    }
}

fn selected(choices: &[String], value: &str) -> bool {
    choices.is_empty() || choices.iter().any(|choice| choice == value)
}
