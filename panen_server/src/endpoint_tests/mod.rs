mod campaigns;
mod engine_backed;
mod enrolment;
mod helpers;
mod mocks;
mod webhook;
