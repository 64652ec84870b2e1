use crate::artifacts::Artifact;
use eyre::{Result, bail};

/// Destination of the artifacts emitted by the publishing consumer.
pub trait ArtifactSink: Send {
    fn publish(&mut self, artifact: Artifact) -> Result<()>;
}

impl<S> ArtifactSink for Box<S>
where
    S: ArtifactSink + ?Sized,
{
    fn publish(&mut self, artifact: Artifact) -> Result<()> {
        (**self).publish(artifact)
    }
}

/// Forwards artifacts to a [flume] channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: flume::Sender<Artifact>,
}

impl ChannelSink {
    pub fn new(tx: flume::Sender<Artifact>) -> Self {
        Self { tx }
    }

    /// Creates a sink with an unbounded channel and returns its receiver.
    pub fn unbounded() -> (Self, flume::Receiver<Artifact>) {
        let (tx, rx) = flume::unbounded();
        (Self { tx }, rx)
    }
}

impl ArtifactSink for ChannelSink {
    fn publish(&mut self, artifact: Artifact) -> Result<()> {
        let kind = artifact.kind();
        if self.tx.try_send(artifact).is_err() {
            bail!("artifact channel is closed or full, dropped {kind}");
        }
        Ok(())
    }
}
