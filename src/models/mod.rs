// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BirthProfile, CodeRecord, CompatibilityMatch, CorrelationWeights, InvitationStatus, LineEntry,
    MatchAnalysis, MatchInvitation, MatchScores, MatchStatus, MatchType, MountEntry, PartyRef,
    PlaceOfBirth, Prominence, ReadingDocument, ReadingSnapshot, ScoringWeights, ShareSummary,
    ValidationError,
};
pub use requests::{
    AstroRequest, CompareByCodeRequest, CompleteMatchRequest, CreateInvitationRequest,
    CreateMatchRequest, DiscoverQuery, IssueCodeRequest, ScoreRequest,
};
pub use responses::{
    AstroResponse, CompareByCodeResponse, CreateInvitationResponse, DiscoverResponse, ErrorResponse,
    HealthResponse, InvitationResponse, IssueCodeResponse, MatchResponse, PublishResponse,
    ResolveCodeResponse, SweepResponse,
};
