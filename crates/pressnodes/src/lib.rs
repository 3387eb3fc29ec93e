//! Built-in node library
//!
//! One handler per node kind, plus the HTTP gateway that backs the
//! collaborator contracts in production.

mod ai;
pub mod extract;
mod filter;
pub mod http;
mod image;
mod notify;
mod publish;
mod quality;
mod scrape;
mod search;
mod translate;
mod trigger;

pub use ai::{AiContentProcessorNode, MultiSourceSynthesizerNode};
pub use filter::ContentFilterNode;
pub use http::{GatewayConfig, HttpGateway};
pub use image::ImageGeneratorNode;
pub use notify::EmailNotifierNode;
pub use publish::{PublisherNode, SocialPosterNode};
pub use quality::{SeoAnalyzerNode, SeoReport, StructureValidatorNode};
pub use scrape::ContentScraperNode;
pub use search::{AcademicSearchNode, DeepResearchNode, FeedAggregatorNode, NewsDiscoveryNode};
pub use translate::TranslatorNode;
pub use trigger::TriggerNode;

use presscore::{NodeHandler, NodeKind, Services};
use pressruntime::{NodeFactory, NodeRegistry};
use std::sync::Arc;

/// Factory handing out one shared handler instance for every visit.
pub struct HandlerFactory {
    handler: Arc<dyn NodeHandler>,
}

impl HandlerFactory {
    pub fn new(handler: impl NodeHandler + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl NodeFactory for HandlerFactory {
    fn create(&self) -> Arc<dyn NodeHandler> {
        self.handler.clone()
    }

    fn kind(&self) -> NodeKind {
        self.handler.kind()
    }
}

/// Register a handler for every built-in kind
pub fn register_all(registry: &mut NodeRegistry, services: Services) {
    let Services {
        scraper,
        search,
        text,
        translator,
        images,
        validator,
        publisher,
        notifier,
        social,
    } = services;

    registry.register(Arc::new(HandlerFactory::new(TriggerNode)));
    registry.register(Arc::new(HandlerFactory::new(ContentScraperNode::new(scraper))));
    registry.register(Arc::new(HandlerFactory::new(FeedAggregatorNode::new(search.clone()))));
    registry.register(Arc::new(HandlerFactory::new(NewsDiscoveryNode::new(search.clone()))));
    registry.register(Arc::new(HandlerFactory::new(AcademicSearchNode::new(search.clone()))));
    registry.register(Arc::new(HandlerFactory::new(DeepResearchNode::new(
        search,
        text.clone(),
    ))));
    registry.register(Arc::new(HandlerFactory::new(AiContentProcessorNode::new(text.clone()))));
    registry.register(Arc::new(HandlerFactory::new(MultiSourceSynthesizerNode::new(text))));
    registry.register(Arc::new(HandlerFactory::new(ContentFilterNode)));
    registry.register(Arc::new(HandlerFactory::new(TranslatorNode::new(translator))));
    registry.register(Arc::new(HandlerFactory::new(ImageGeneratorNode::new(images))));
    registry.register(Arc::new(HandlerFactory::new(SeoAnalyzerNode)));
    registry.register(Arc::new(HandlerFactory::new(StructureValidatorNode::new(validator))));
    registry.register(Arc::new(HandlerFactory::new(PublisherNode::new(publisher))));
    registry.register(Arc::new(HandlerFactory::new(SocialPosterNode::new(social))));
    registry.register(Arc::new(HandlerFactory::new(EmailNotifierNode::new(notifier))));
}

/// Registry with every built-in kind bound to `services`
pub fn registry_with(services: Services) -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    register_all(&mut registry, services);
    registry
}
