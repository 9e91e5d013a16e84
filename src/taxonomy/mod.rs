//! Closed subject taxonomy used by every stage of the pipeline.
//!
//! A [`Classification`] always carries a `(Domain, DiagramType)` pair that is
//! valid in this taxonomy. Pairs that do not belong together are normalized to
//! the generic "diagram advisable, engine unspecified" shape instead of being
//! rejected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subject-matter category of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Electrical,
    Mechanical,
    ComputerScience,
    Civil,
    Mathematics,
    Physics,
    Chemistry,
    ComputerEngineering,
    /// Classification failed or the question does not fit a known subject.
    Unknown,
}

impl Domain {
    pub const ALL: [Domain; 9] = [
        Domain::Electrical,
        Domain::Mechanical,
        Domain::ComputerScience,
        Domain::Civil,
        Domain::Mathematics,
        Domain::Physics,
        Domain::Chemistry,
        Domain::ComputerEngineering,
        Domain::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Electrical => "electrical",
            Domain::Mechanical => "mechanical",
            Domain::ComputerScience => "computer_science",
            Domain::Civil => "civil",
            Domain::Mathematics => "mathematics",
            Domain::Physics => "physics",
            Domain::Chemistry => "chemistry",
            Domain::ComputerEngineering => "computer_engineering",
            Domain::Unknown => "unknown",
        }
    }

    /// Diagram types that belong to this domain (excluding `Generic`).
    pub fn diagram_types(&self) -> Vec<DiagramType> {
        DiagramType::ALL
            .iter()
            .copied()
            .filter(|t| t.domain() == Some(*self))
            .collect()
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "electrical" | "electrical_engineering" | "ee" => Ok(Domain::Electrical),
            "mechanical" | "mechanical_engineering" | "me" => Ok(Domain::Mechanical),
            "computer_science" | "cs" => Ok(Domain::ComputerScience),
            "civil" | "civil_engineering" => Ok(Domain::Civil),
            "mathematics" | "math" | "maths" => Ok(Domain::Mathematics),
            "physics" => Ok(Domain::Physics),
            "chemistry" => Ok(Domain::Chemistry),
            "computer_engineering" | "ce" => Ok(Domain::ComputerEngineering),
            "unknown" => Ok(Domain::Unknown),
            _ => Err(format!("Unknown domain: {}", s)),
        }
    }
}

/// Domain-scoped kind of diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramType {
    // electrical
    CircuitSchematic,
    PhasorDiagram,
    WaveformPlot,
    BodePlot,
    // mechanical
    FreeBodyDiagram,
    BeamDiagram,
    MechanismSketch,
    ThermodynamicCycle,
    // computer science
    BinaryTree,
    GraphNetwork,
    Flowchart,
    StateMachine,
    DataStructure,
    // civil
    TrussDiagram,
    ShearMomentDiagram,
    CrossSection,
    SiteLayout,
    // mathematics
    FunctionPlot,
    GeometricFigure,
    VennDiagram,
    CoordinateGeometry,
    // physics
    RayDiagram,
    FieldLines,
    MotionGraph,
    EnergyLevelDiagram,
    // chemistry
    MolecularStructure,
    ReactionApparatus,
    PhaseDiagram,
    // computer engineering
    LogicGateCircuit,
    TimingDiagram,
    BlockDiagram,
    PipelineDiagram,
    /// Valid in every domain: a diagram is advisable but nothing more specific is known.
    Generic,
}

impl DiagramType {
    pub const ALL: [DiagramType; 33] = [
        DiagramType::CircuitSchematic,
        DiagramType::PhasorDiagram,
        DiagramType::WaveformPlot,
        DiagramType::BodePlot,
        DiagramType::FreeBodyDiagram,
        DiagramType::BeamDiagram,
        DiagramType::MechanismSketch,
        DiagramType::ThermodynamicCycle,
        DiagramType::BinaryTree,
        DiagramType::GraphNetwork,
        DiagramType::Flowchart,
        DiagramType::StateMachine,
        DiagramType::DataStructure,
        DiagramType::TrussDiagram,
        DiagramType::ShearMomentDiagram,
        DiagramType::CrossSection,
        DiagramType::SiteLayout,
        DiagramType::FunctionPlot,
        DiagramType::GeometricFigure,
        DiagramType::VennDiagram,
        DiagramType::CoordinateGeometry,
        DiagramType::RayDiagram,
        DiagramType::FieldLines,
        DiagramType::MotionGraph,
        DiagramType::EnergyLevelDiagram,
        DiagramType::MolecularStructure,
        DiagramType::ReactionApparatus,
        DiagramType::PhaseDiagram,
        DiagramType::LogicGateCircuit,
        DiagramType::TimingDiagram,
        DiagramType::BlockDiagram,
        DiagramType::PipelineDiagram,
        DiagramType::Generic,
    ];

    /// Owning domain, or `None` for [`DiagramType::Generic`].
    pub fn domain(&self) -> Option<Domain> {
        use DiagramType::*;
        match self {
            CircuitSchematic | PhasorDiagram | WaveformPlot | BodePlot => Some(Domain::Electrical),
            FreeBodyDiagram | BeamDiagram | MechanismSketch | ThermodynamicCycle => {
                Some(Domain::Mechanical)
            }
            BinaryTree | GraphNetwork | Flowchart | StateMachine | DataStructure => {
                Some(Domain::ComputerScience)
            }
            TrussDiagram | ShearMomentDiagram | CrossSection | SiteLayout => Some(Domain::Civil),
            FunctionPlot | GeometricFigure | VennDiagram | CoordinateGeometry => {
                Some(Domain::Mathematics)
            }
            RayDiagram | FieldLines | MotionGraph | EnergyLevelDiagram => Some(Domain::Physics),
            MolecularStructure | ReactionApparatus | PhaseDiagram => Some(Domain::Chemistry),
            LogicGateCircuit | TimingDiagram | BlockDiagram | PipelineDiagram => {
                Some(Domain::ComputerEngineering)
            }
            Generic => None,
        }
    }

    /// Diagram types whose accuracy depends on exact coordinates or graph
    /// layout. These render measurably better from code than from a
    /// generative image model.
    pub fn prefers_code(&self) -> bool {
        use DiagramType::*;
        matches!(
            self,
            WaveformPlot
                | BodePlot
                | ShearMomentDiagram
                | FunctionPlot
                | CoordinateGeometry
                | MotionGraph
                | PhaseDiagram
                | BinaryTree
                | GraphNetwork
                | StateMachine
                | DataStructure
                | TimingDiagram
                | CircuitSchematic
                | LogicGateCircuit
        )
    }

    /// Diagram types with standardized symbol sets that compile well from markup.
    pub fn prefers_schematic(&self) -> bool {
        use DiagramType::*;
        matches!(
            self,
            CircuitSchematic
                | LogicGateCircuit
                | BlockDiagram
                | Flowchart
                | StateMachine
                | PipelineDiagram
        )
    }

    pub fn as_str(&self) -> &'static str {
        use DiagramType::*;
        match self {
            CircuitSchematic => "circuit_schematic",
            PhasorDiagram => "phasor_diagram",
            WaveformPlot => "waveform_plot",
            BodePlot => "bode_plot",
            FreeBodyDiagram => "free_body_diagram",
            BeamDiagram => "beam_diagram",
            MechanismSketch => "mechanism_sketch",
            ThermodynamicCycle => "thermodynamic_cycle",
            BinaryTree => "binary_tree",
            GraphNetwork => "graph_network",
            Flowchart => "flowchart",
            StateMachine => "state_machine",
            DataStructure => "data_structure",
            TrussDiagram => "truss_diagram",
            ShearMomentDiagram => "shear_moment_diagram",
            CrossSection => "cross_section",
            SiteLayout => "site_layout",
            FunctionPlot => "function_plot",
            GeometricFigure => "geometric_figure",
            VennDiagram => "venn_diagram",
            CoordinateGeometry => "coordinate_geometry",
            RayDiagram => "ray_diagram",
            FieldLines => "field_lines",
            MotionGraph => "motion_graph",
            EnergyLevelDiagram => "energy_level_diagram",
            MolecularStructure => "molecular_structure",
            ReactionApparatus => "reaction_apparatus",
            PhaseDiagram => "phase_diagram",
            LogicGateCircuit => "logic_gate_circuit",
            TimingDiagram => "timing_diagram",
            BlockDiagram => "block_diagram",
            PipelineDiagram => "pipeline_diagram",
            Generic => "generic",
        }
    }
}

impl fmt::Display for DiagramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagramType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        DiagramType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("Unknown diagram type: {}", s))
    }
}

/// Rough drawing complexity estimated by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    #[default]
    Moderate,
    Complex,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Moderate => "moderate",
            Complexity::Complex => "complex",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Complexity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simple" | "low" => Ok(Complexity::Simple),
            "moderate" | "medium" => Ok(Complexity::Moderate),
            "complex" | "high" => Ok(Complexity::Complex),
            _ => Err(format!("Unknown complexity: {}", s)),
        }
    }
}

/// Returns true when `diagram_type` may be used under `domain`.
///
/// `Generic` pairs with every domain; `Unknown` pairs only with `Generic`.
pub fn is_valid_pair(domain: Domain, diagram_type: DiagramType) -> bool {
    match diagram_type.domain() {
        None => true,
        Some(owner) => owner == domain,
    }
}

/// Output of the domain classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub domain: Domain,
    pub diagram_type: DiagramType,
    pub complexity: Complexity,
    /// False when a code-based renderer is structurally better than a
    /// generative image model for this diagram.
    pub generative_suitable: bool,
}

impl Classification {
    /// Build a classification, normalizing pairs the taxonomy does not allow.
    pub fn new(
        domain: Domain,
        diagram_type: DiagramType,
        complexity: Complexity,
        generative_suitable: bool,
    ) -> Self {
        if is_valid_pair(domain, diagram_type) {
            Self {
                domain,
                diagram_type,
                complexity,
                generative_suitable,
            }
        } else {
            Self::generic(domain, complexity)
        }
    }

    /// "Diagram advisable, engine unspecified" for a (possibly known) domain.
    pub fn generic(domain: Domain, complexity: Complexity) -> Self {
        Self {
            domain,
            diagram_type: DiagramType::Generic,
            complexity,
            generative_suitable: true,
        }
    }

    /// Safe default used when classification times out or is malformed.
    pub fn fallback() -> Self {
        Self::generic(Domain::Unknown, Complexity::Moderate)
    }

    pub fn is_fallback(&self) -> bool {
        self.domain == Domain::Unknown && self.diagram_type == DiagramType::Generic
    }
}

impl Default for Classification {
    fn default() -> Self {
        Self::fallback()
    }
}
