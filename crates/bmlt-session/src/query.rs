//! Change history queries.

use chrono::NaiveDate;

use bmlt_protocol::Query;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Filters for a change history request. Unset and non-positive ids are
/// left out of the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub meeting_id: Option<i64>,
    pub service_body_id: Option<i64>,
    /// Only honoured while logged in.
    pub user_id: Option<i64>,
}

impl ChangeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn for_meeting(mut self, meeting_id: i64) -> Self {
        self.meeting_id = Some(meeting_id);
        self
    }

    pub fn for_service_body(mut self, service_body_id: i64) -> Self {
        self.service_body_id = Some(service_body_id);
        self
    }

    pub fn by_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// The meeting the results belong to, if the query targets one.
    pub fn target_meeting(&self) -> Option<i64> {
        positive(self.meeting_id)
    }

    pub(crate) fn to_query(&self, logged_in: bool) -> Query {
        let user_id = if logged_in { positive(self.user_id) } else { None };
        let query = Query::new()
            .param_opt("user_id", user_id)
            .param_opt("meeting_id", positive(self.meeting_id));
        let query = if self.target_meeting().is_some() {
            query
        } else {
            query.param_opt("service_body_id", positive(self.service_body_id))
        };
        with_dates(query, self.from, self.to)
    }
}

/// Filters for a deleted-meetings request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletedQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub service_body_ids: Vec<i64>,
}

impl DeletedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn in_service_bodies(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.service_body_ids = ids.into_iter().collect();
        self
    }

    pub(crate) fn to_query(&self) -> Query {
        let mut query = Query::new();
        match self.service_body_ids.as_slice() {
            [] => {}
            [single] if *single > 0 => query = query.param("service_body_id", single),
            many => {
                for id in many {
                    query = query.param("service_body_id[]", id);
                }
            }
        }
        with_dates(query, self.from, self.to)
    }
}

fn positive(id: Option<i64>) -> Option<i64> {
    id.filter(|id| *id > 0)
}

fn with_dates(query: Query, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Query {
    query
        .param_opt("start_date", from.map(|d| d.format(DATE_FORMAT)))
        .param_opt("end_date", to.map(|d| d.format(DATE_FORMAT)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmlt_protocol::{CallType, request_uri};

    fn uri(call: CallType, query: &Query) -> String {
        request_uri("https://x.org/main_server", call, query, "t")
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn change_query_parameters() {
        let query = ChangeQuery::new()
            .between(Some(date("2024-01-02")), Some(date("2024-02-03")))
            .for_service_body(5)
            .by_user(9);
        insta::assert_snapshot!(uri(CallType::Changes, &query.to_query(true)), @"https://x.org/main_server/client_interface/json/?switcher=GetChanges&user_id=9&service_body_id=5&start_date=2024-01-02&end_date=2024-02-03&callingApp=t");
        assert!(!uri(CallType::Changes, &query.to_query(false)).contains("user_id"));
    }

    #[test]
    fn meeting_target_hides_service_body() {
        let query = ChangeQuery::new().for_meeting(42).for_service_body(5);
        let text = uri(CallType::MeetingChanges, &query.to_query(false));
        assert!(text.contains("&meeting_id=42"));
        assert!(!text.contains("service_body_id"));
        assert_eq!(query.target_meeting(), Some(42));
        assert_eq!(ChangeQuery::new().for_meeting(0).target_meeting(), None);
    }

    #[test]
    fn deleted_query_service_bodies() {
        let none = DeletedQuery::new().to_query();
        assert!(none.is_empty());

        let one = uri(CallType::DeletedMeetings, &DeletedQuery::new().in_service_bodies([3]).to_query());
        assert!(one.contains("&service_body_id=3&"));

        let many = uri(
            CallType::DeletedMeetings,
            &DeletedQuery::new().in_service_bodies([3, 4]).to_query(),
        );
        assert!(many.contains("&service_body_id[]=3&service_body_id[]=4&"));
    }
}
