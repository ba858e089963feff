pub mod audience;
pub mod campaign;
pub mod campaign_link;
pub mod campaign_recipient;
pub mod click_event;
pub mod contact;

pub use audience::Entity as AudienceEntity;
pub use campaign::Entity as CampaignEntity;
pub use campaign_link::Entity as CampaignLinkEntity;
pub use campaign_recipient::Entity as CampaignRecipientEntity;
pub use click_event::Entity as ClickEventEntity;
pub use contact::Entity as ContactEntity;
