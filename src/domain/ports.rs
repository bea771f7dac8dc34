use crate::domain::model::{MemberId, MemberRecord, RoundReport};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn group_name(&self) -> &str;
    fn data_path(&self) -> &str;
    /// `None` means infer from the data file extension.
    fn input_format(&self) -> Option<&str>;
    fn output_path(&self) -> &str;
    /// `None` means infer from the output file extension.
    fn output_format(&self) -> Option<&str>;
    fn rounds(&self) -> usize;
    fn seed(&self) -> Option<u64>;
    fn members_output(&self) -> Option<&str>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<MemberRecord>>;
    async fn transform(&self, records: Vec<MemberRecord>) -> Result<RoundReport>;
    async fn load(&self, result: RoundReport) -> Result<String>;
}

/// Randomness used by the initial split and the per-round swap.
pub trait RandomSource {
    fn shuffle(&mut self, ids: &mut [MemberId]);
    /// Uniform index in `[0, upper)`. Callers pass `upper > 0`.
    fn uniform_index(&mut self, upper: usize) -> usize;
}

impl<T: RandomSource + ?Sized> RandomSource for Box<T> {
    fn shuffle(&mut self, ids: &mut [MemberId]) {
        (**self).shuffle(ids)
    }

    fn uniform_index(&mut self, upper: usize) -> usize {
        (**self).uniform_index(upper)
    }
}
