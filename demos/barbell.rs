use commune::{Cpm, Graph, Leiden, Louvain, Modularity, Partition, QualityMetric, Weighting};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug shows the progress of every level.
    env_logger::init();

    // Two 5-cliques joined by the path 4-5-6-7.
    let mut edges = Vec::new();
    for (lo, hi) in [(0, 5), (7, 12)] {
        for u in lo..hi {
            for v in u + 1..hi {
                edges.push((u, v, 1.0));
            }
        }
    }
    edges.extend([(4, 5, 1.0), (5, 6, 1.0), (6, 7, 1.0)]);
    let graph = Graph::from_edges(12, edges)?;
    let singletons = Partition::singletons(&graph);

    let modularity = Modularity::new(1.75);
    let by_modularity = Leiden::new(modularity).with_gamma(1.0).run(&graph, None)?;
    report("leiden, modularity(1.75)", &graph, &by_modularity, &modularity);

    let cpm = Cpm::new(0.5);
    let by_cpm = Leiden::new(cpm)
        .with_gamma(1.0)
        .run(&graph, Some(&singletons))?;
    report("leiden, cpm(0.5)", &graph, &by_cpm, &cpm);

    let baseline = Louvain::default().run(&graph, None)?;
    report("louvain, modularity(1.0)", &graph, &baseline, &Modularity::default());

    Ok(())
}

fn report<Q: QualityMetric>(name: &str, graph: &Graph, partition: &Partition, quality: &Q) {
    println!(
        "{name}: {} communities, quality {:.4}",
        partition.len(),
        quality.score(graph, partition, Weighting::Unit)
    );
    for (_, members) in partition.communities() {
        let ids: Vec<usize> = members.iter().map(|v| v.index()).collect();
        println!("  {ids:?}");
    }
}
