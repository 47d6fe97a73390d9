use serde::{Deserialize, Serialize};

use crate::{
    domain::ModuleNode,
    model::entity::{Program, ProgramFilter, ProgramModuleOutline},
};

#[derive(Debug, Clone, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProgramQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl ProgramQuery {
    pub fn paging(&self) -> (i64, i64) {
        crate::web::routes::clamp_paging(self.limit, self.offset)
    }

    pub fn filter(&self) -> ProgramFilter {
        let clean = |v: &Option<String>| {
            v.as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        ProgramFilter {
            category: clean(&self.category),
            search: clean(&self.search),
        }
    }
}

/// A program with its modules, topics and resources in order.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ProgramDetails {
    #[serde(flatten)]
    pub program: Program,
    pub modules: Vec<ProgramModuleOutline>,
}

/// An enrolled program with the ids of its modules and topics.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EnrolledProgram {
    #[serde(flatten)]
    pub program: Program,
    pub modules: Vec<ModuleNode>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn blank_filters_are_dropped() {
        let query = ProgramQuery {
            category: Some("  ".into()),
            search: Some(" rust ".into()),
            limit: 10,
            offset: 0,
        };
        let filter = query.filter();
        assert!(filter.category.is_none());
        assert_eq!(filter.search.as_deref(), Some("rust"));
    }
}
