use shared::domain::{Community, CommunityId, Draft, ReviewRequest};

/// Which community the depositor picked, and how that relates to the review
/// request the record already carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommunitySelection {
    pub selected: Option<Community>,
    pub record_has_inclusion_request: bool,
    pub is_review_for_selected_community: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    None,
    CreateOrUpdate(CommunityId),
    Delete,
}

impl CommunitySelection {
    pub fn for_record(record: &Draft, selected: Option<Community>) -> Self {
        let review = record.review();
        let is_review_for_selected_community =
            match (review.and_then(ReviewRequest::community), selected.as_ref()) {
                (Some(requested), Some(community)) => requested == community.id,
                _ => false,
            };

        Self {
            selected,
            record_has_inclusion_request: review.is_some(),
            is_review_for_selected_community,
        }
    }

    pub fn review_action(&self) -> ReviewAction {
        match &self.selected {
            Some(community) if !self.is_review_for_selected_community => {
                ReviewAction::CreateOrUpdate(community.id)
            }
            None if self.record_has_inclusion_request => ReviewAction::Delete,
            _ => ReviewAction::None,
        }
    }
}
