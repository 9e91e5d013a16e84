//! Guidance tables keyed by diagram type and domain.

use super::Guidance;
use crate::taxonomy::{DiagramType, Domain};

/// Guidance for a specific diagram type. Exhaustive over [`DiagramType`], so a
/// new variant does not compile until it has an entry.
pub(super) fn for_diagram_type(diagram_type: DiagramType) -> Option<Guidance> {
    use DiagramType::*;
    let g = match diagram_type {
        CircuitSchematic => Guidance {
            agent: "Circuit questions benefit from a schematic when components, their connections or measurement points are named. Prefer the schematic tool; describe every component with its designator and given value, the topology (series, parallel, bridge) and any source polarity.",
            style: "Draw a clean schematic with standard IEEE symbols: zig-zag resistors, parallel-plate capacitors, coil inductors, circle sources with polarity marks. Label each component with its designator and value, e.g. 'R1 10Ω'. Use orthogonal wires, dots at junctions, and a white background.",
            reviewer: "A circuit schematic must use standard component symbols, show every given component labeled with designator and value, and have a topology that matches the question (series vs. parallel). Wires must connect; no floating terminals.",
        },
        PhasorDiagram => Guidance {
            agent: "Phasor questions need a diagram when magnitudes and phase angles are given. Describe each phasor with its label, magnitude and angle relative to the reference.",
            style: "Draw phasors as arrows from a common origin on a light polar grid. Label each arrow with its symbol and magnitude, mark angles with arcs and degree labels. Keep the reference phasor horizontal.",
            reviewer: "Phasors must start from a common origin, angles must be drawn in the stated direction, and each arrow must carry its symbol.",
        },
        WaveformPlot => Guidance {
            agent: "Waveform questions need precise axes. Prefer code plotting; specify the signal expression, time range, amplitude and labeled points.",
            style: "Plot the waveform with labeled time and amplitude axes including units, light gridlines, and annotations for given peaks or periods. Use one color per signal with a legend when there is more than one.",
            reviewer: "Axes must be labeled with units and the waveform shape must match the given expression (period, amplitude, offset).",
        },
        BodePlot => Guidance {
            agent: "Bode plots must be computed, not sketched. Prefer code plotting with the transfer function and frequency range.",
            style: "Plot magnitude in dB and phase in degrees against log frequency, stacked vertically with a shared x-axis. Mark given corner frequencies with dashed lines.",
            reviewer: "The frequency axis must be logarithmic, magnitude in dB, and corner frequencies marked where given.",
        },
        FreeBodyDiagram => Guidance {
            agent: "Free-body diagrams help whenever forces act on a body. List the body, every force with its symbol, direction and given magnitude, and any incline angle.",
            style: "Draw the object as a simple block or dot. Draw forces as labeled arrows radiating from the object, arrow length roughly proportional to magnitude. Label each with its symbol and given value. Show incline angles with an arc.",
            reviewer: "A free-body diagram must show force arrows originating at the object, each labeled with its symbol. A generic box without force arrows is not acceptable.",
        },
        BeamDiagram => Guidance {
            agent: "Beam problems need the span, supports, and loads. Describe support types, positions along the beam, point and distributed loads with values.",
            style: "Draw the beam as a horizontal bar with standard support symbols (triangle pin, circle roller, hatched fixed wall). Show point loads as downward arrows and distributed loads as arrow rows, all labeled. Dimension the spans below the beam.",
            reviewer: "Supports must use standard symbols and every given load and span dimension must be labeled in its stated position.",
        },
        MechanismSketch => Guidance {
            agent: "Mechanism questions (linkages, gears, pulleys) benefit from a sketch showing members and joints. Name each link and its length or ratio.",
            style: "Sketch links as bars with pin joints as small circles, ground as hatched lines. Label link lengths and angular velocities. Keep perspective flat and two-dimensional.",
            reviewer: "Every named link or gear must appear, joints must be visible, and given lengths or ratios must be labeled.",
        },
        ThermodynamicCycle => Guidance {
            agent: "Cycle questions need a P-v or T-s diagram with numbered states. Give the state points and process types between them.",
            style: "Plot the cycle on labeled axes with numbered state points and arrows showing process direction. Label given pressures and temperatures at the states.",
            reviewer: "States must be numbered, the process direction shown, and axes must be the requested properties.",
        },
        BinaryTree => Guidance {
            agent: "Tree questions need an exact layout. Prefer code; list the nodes and parent-child relations level by level.",
            style: "Use a top-down hierarchical layout with directed edges from parent to child. Nodes are circles containing their keys; left and right children are placed consistently. Avoid edge crossings.",
            reviewer: "The tree structure must match the question exactly (same keys, same parent-child relations) and left/right placement must be preserved.",
        },
        GraphNetwork => Guidance {
            agent: "Graph questions need exact vertices and edges. Prefer code; list vertices, edges, direction and weights.",
            style: "Draw vertices as labeled circles with a force-directed or circular layout. Draw edges as lines or arrows for directed graphs with weights placed at edge midpoints.",
            reviewer: "All vertices and edges from the question must be present with correct weights and directions; no extra edges.",
        },
        Flowchart => Guidance {
            agent: "Flowcharts help for algorithm or process questions. List the steps, decisions and their branches.",
            style: "Use standard flowchart shapes: rounded terminals, rectangles for steps, diamonds for decisions with yes/no labeled branches. Flow top to bottom with arrows.",
            reviewer: "Decision diamonds must have labeled branches and the sequence must follow the described process.",
        },
        StateMachine => Guidance {
            agent: "State machine questions need states and labeled transitions. List states, the start state, accepting states and transitions with their inputs.",
            style: "Draw states as circles, accepting states as double circles, and the start state with an incoming arrow. Label transitions with their input symbols; use self-loops where needed.",
            reviewer: "Every state and transition must be present with the correct labels, and start/accepting states must be marked.",
        },
        DataStructure => Guidance {
            agent: "Linked lists, stacks, queues, hash tables and arrays benefit from a memory layout diagram. Give the elements in order and pointer relations.",
            style: "Draw cells as boxes with values, pointers as arrows between boxes, and index labels below array cells. Mark head, tail or top clearly.",
            reviewer: "Element order and pointers must match the question, with head/tail/top markers where relevant.",
        },
        TrussDiagram => Guidance {
            agent: "Truss questions need joint positions, members, supports and loads. Name the joints and give the dimensions.",
            style: "Draw members as straight lines between lettered joints, supports with standard symbols, and external loads as labeled arrows at joints. Dimension panel widths and heights.",
            reviewer: "Joints must be lettered as in the question, supports correct, loads applied at the stated joints.",
        },
        ShearMomentDiagram => Guidance {
            agent: "Shear and moment diagrams are computed from the loading. Prefer code and describe only the beam and loads, never the resulting values.",
            style: "Stack the loaded beam, the shear diagram and the moment diagram vertically with aligned x-axes. Label axes and positions but leave computed extreme values unlabeled.",
            reviewer: "The loaded beam must match the question. Computed shear or moment values that the question asks for must not be printed.",
        },
        CrossSection => Guidance {
            agent: "Section property questions need the shape with dimensions. Give every dimension and the reference axes.",
            style: "Draw the cross-section with hatch fill, dimension lines with arrowheads and values, and the reference axes dashed through the given origin.",
            reviewer: "All given dimensions must be shown on dimension lines; the centroid must not be marked if the question asks for it.",
        },
        SiteLayout => Guidance {
            agent: "Surveying and site questions benefit from a plan view. Give the points, bearings and distances.",
            style: "Draw a plan view with a north arrow, labeled points, and distances and bearings along lines. Use a simple scale bar.",
            reviewer: "Points, bearings and distances must match the question and a north arrow must be present.",
        },
        FunctionPlot => Guidance {
            agent: "Function plots must be exact. Prefer code; give the function, domain and any points that should be marked.",
            style: "Plot on Cartesian axes through the origin with tick labels, light gridlines and the curve labeled with its expression. Mark only points given in the question.",
            reviewer: "The curve must match the stated function on the stated domain. Roots, extrema or intersections the question asks for must not be marked.",
        },
        GeometricFigure => Guidance {
            agent: "Geometry questions benefit from the figure with given measurements. Give the shape, vertices, side lengths and angles that are known.",
            style: "Draw the figure with labeled vertices, given side lengths along the sides and given angles with arcs. Mark right angles with small squares. Leave the unknown quantity unlabeled or marked with a question mark.",
            reviewer: "Given lengths and angles must be labeled; the unknown the question asks for (area, missing side, angle) must not be shown as a value.",
        },
        VennDiagram => Guidance {
            agent: "Set questions benefit from a Venn diagram. Name the sets and any given region counts.",
            style: "Draw overlapping circles inside a labeled universal rectangle. Label each set and place given counts inside their regions.",
            reviewer: "Every set must be labeled and only given counts may appear in regions.",
        },
        CoordinateGeometry => Guidance {
            agent: "Coordinate geometry needs exact placement. Prefer code; give the points, lines and shapes with coordinates.",
            style: "Plot on a square-aspect grid with labeled axes, labeled points with their coordinates and lines drawn through the given points.",
            reviewer: "Points must be at their stated coordinates and the axes must use equal scale.",
        },
        RayDiagram => Guidance {
            agent: "Optics questions need the lens or mirror, object position and focal points. Give distances and focal length.",
            style: "Draw the principal axis, the lens or mirror, focal points F and 2F, the object arrow and principal rays with arrowheads. Label distances along the axis.",
            reviewer: "Principal rays must obey the lens/mirror rules and given distances must be labeled; the image distance must not be labeled if asked for.",
        },
        FieldLines => Guidance {
            agent: "Field questions benefit from the source arrangement with field lines. Give charges, currents or magnets and their positions.",
            style: "Draw sources with sign or polarity labels and field lines with arrows showing direction, denser near strong regions.",
            reviewer: "Field direction must be consistent with source signs and lines must not cross.",
        },
        MotionGraph => Guidance {
            agent: "Kinematics graphs need exact segments. Prefer code; give the time intervals and values at segment boundaries.",
            style: "Plot the requested quantity against time with labeled axes and units. Mark segment boundaries with dashed guides.",
            reviewer: "Segments must match the given intervals and values; derived quantities the question asks for must not be annotated.",
        },
        EnergyLevelDiagram => Guidance {
            agent: "Energy level questions need the levels and transitions. Give level energies or quantum numbers and the transitions of interest.",
            style: "Draw horizontal levels with labels on the left and energies on the right. Draw transitions as vertical arrows.",
            reviewer: "Levels must be ordered by energy and transitions must connect the stated levels.",
        },
        MolecularStructure => Guidance {
            agent: "Structure questions benefit from a skeletal or Lewis structure. Give the molecule and any groups that should be highlighted.",
            style: "Draw a clean skeletal or Lewis structure with element symbols, bonds as lines (double and triple where needed) and lone pairs as dots when relevant.",
            reviewer: "Atoms, bonds and charges must be chemically valid for the named molecule.",
        },
        ReactionApparatus => Guidance {
            agent: "Lab setup questions benefit from an apparatus sketch. Name each piece of glassware and its arrangement.",
            style: "Draw labeled laboratory glassware in a simple line-art style, connected as described, with labels and leader lines.",
            reviewer: "Every named apparatus must appear, labeled and connected as described.",
        },
        PhaseDiagram => Guidance {
            agent: "Phase diagrams need accurate boundaries. Prefer code; give the axes ranges and any marked points.",
            style: "Plot phase boundaries on labeled pressure-temperature axes, label regions by phase, and mark given points.",
            reviewer: "Regions must be labeled and given points placed correctly; triple or critical points asked for must not be annotated with values.",
        },
        LogicGateCircuit => Guidance {
            agent: "Logic circuits need standard gate symbols. Prefer the schematic tool; list the inputs, gates and their connections.",
            style: "Draw ANSI gate symbols with inputs on the left and outputs on the right, labeled input and output lines, and bubbles for inversion.",
            reviewer: "Gates must use standard symbols, every input and output must be labeled, and connections must match the described expression.",
        },
        TimingDiagram => Guidance {
            agent: "Timing diagrams must be exact. Prefer code; give the signals, clock period and transition times.",
            style: "Draw stacked digital waveforms sharing a time axis with signal names on the left, clock edges marked by dashed verticals.",
            reviewer: "Transitions must align with the stated clock edges and every named signal must be present.",
        },
        BlockDiagram => Guidance {
            agent: "System questions benefit from a block diagram. List the blocks, their transfer functions or roles, and the signal flow.",
            style: "Draw blocks as rectangles with their labels inside, signal arrows between them, summing junctions as circles with signs.",
            reviewer: "All blocks and feedback paths must be present with correct signs at summing junctions.",
        },
        PipelineDiagram => Guidance {
            agent: "Processor pipeline questions benefit from a stage-by-cycle table. Give the instructions and stages.",
            style: "Draw a grid with clock cycles across and instructions down, stage abbreviations in the cells and stalls marked clearly.",
            reviewer: "Stages must be in order per instruction; the total cycle count must not be stated if the question asks for it.",
        },
        Generic => return None,
    };
    Some(g)
}

/// Domain-level guidance used when the diagram type is generic.
pub(super) fn for_domain(domain: Domain) -> Option<Guidance> {
    let g = match domain {
        Domain::Electrical => Guidance {
            agent: "Electrical questions usually benefit from a schematic or signal plot when components or waveforms are described.",
            style: "Use standard electrical symbols, label every component with designator and value, and keep wiring orthogonal.",
            reviewer: "Electrical symbols must be standard and every given component value must be labeled.",
        },
        Domain::Mechanical => Guidance {
            agent: "Mechanical questions benefit from a diagram when bodies, forces, supports or mechanisms are described.",
            style: "Use clean engineering line art with labeled force arrows, dimensions and standard support symbols.",
            reviewer: "Forces must be arrows with labels and dimensions must match the question.",
        },
        Domain::ComputerScience => Guidance {
            agent: "Computer science questions benefit from a diagram when structures, graphs or control flow are described.",
            style: "Use clear node-and-edge layouts with labeled nodes and consistent arrow direction.",
            reviewer: "The depicted structure must match the question exactly.",
        },
        Domain::Civil => Guidance {
            agent: "Civil questions benefit from a diagram when structures, sections or site geometry are described.",
            style: "Use standard structural symbols, dimension lines and labeled loads.",
            reviewer: "Supports, loads and dimensions must match the question.",
        },
        Domain::Mathematics => Guidance {
            agent: "Mathematics questions benefit from a figure when geometry, graphs or sets are involved.",
            style: "Draw precise figures with labeled points and given measurements only.",
            reviewer: "Given measurements must be labeled and the requested result must not appear.",
        },
        Domain::Physics => Guidance {
            agent: "Physics questions benefit from a diagram when a physical setup, optics or fields are described.",
            style: "Sketch the setup in clean line art with labeled quantities and direction arrows.",
            reviewer: "The setup must match the question and quantities must be labeled with their symbols.",
        },
        Domain::Chemistry => Guidance {
            agent: "Chemistry questions benefit from a diagram when structures, apparatus or phase behavior are described.",
            style: "Use standard chemical notation and labeled line-art apparatus.",
            reviewer: "Structures must be chemically valid and apparatus labeled.",
        },
        Domain::ComputerEngineering => Guidance {
            agent: "Computer engineering questions benefit from a diagram when gates, timing or datapaths are described.",
            style: "Use standard gate and block symbols with labeled signals.",
            reviewer: "Signals and gates must be labeled and connected as described.",
        },
        Domain::Unknown => return None,
    };
    Some(g)
}
